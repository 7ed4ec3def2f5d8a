//! Retry scheduling, permanent failures, and exhaustion.

use vix_outbox::{OperationStatus, OutboxConfig, RetryPolicy};

use super::harness::{Rule, TestRig};
use crate::engine::EngineConfig;

#[test]
fn retryable_failure_then_success() {
    let rig = TestRig::new();
    rig.transport
        .set_rule_for_target("/api/messages", Rule::retryable_failure("503 unavailable"));

    let id = rig.enqueue(0);

    // First tick: one attempt, recorded as a scheduled retry.
    assert!(rig.engine.tick(0).unwrap() >= 1);
    assert_eq!(rig.transport.call_count(), 1);

    let op = rig.op(&id);
    assert_eq!(op.status, OperationStatus::Failed);
    assert_eq!(op.attempt, 1);
    assert_eq!(op.last_error, "503 unavailable");
    assert!(op.next_retry_at_ms > 0);

    // Before the schedule nothing happens.
    assert_eq!(rig.engine.tick(op.next_retry_at_ms - 1).unwrap(), 0);
    assert_eq!(rig.transport.call_count(), 1);

    // The remote recovers; the retry goes through.
    rig.transport
        .set_rule_for_target("/api/messages", Rule::success());
    assert!(rig.engine.tick(op.next_retry_at_ms).unwrap() >= 1);
    assert!(rig.transport.call_count() >= 2);
    assert_eq!(rig.status_of(&id), OperationStatus::Done);
}

#[test]
fn backoff_grows_between_attempts() {
    let rig = TestRig::new();
    rig.transport.set_default(Rule::retryable_failure("flaky"));
    let id = rig.enqueue(0);

    rig.engine.tick(0).unwrap();
    let first = rig.op(&id);
    assert_eq!(first.attempt, 1);
    let first_delay = first.next_retry_at_ms - first.updated_at_ms;

    rig.engine.tick(first.next_retry_at_ms).unwrap();
    let second = rig.op(&id);
    assert_eq!(second.attempt, 2);
    let second_delay = second.next_retry_at_ms - second.updated_at_ms;

    assert!(second_delay > first_delay);
}

#[test]
fn permanent_failure_never_retries() {
    let rig = TestRig::new();
    rig.transport.set_rule_for_target(
        "/api/messages",
        Rule::permanent_failure("bad request (permanent)"),
    );

    let id = rig.enqueue(0);
    assert!(rig.engine.tick(0).unwrap() >= 1);
    assert_eq!(rig.transport.call_count(), 1);

    let op = rig.op(&id);
    assert_eq!(op.status, OperationStatus::PermanentFailed);
    assert!(op.last_error.contains("permanent"));

    // Later ticks leave it alone.
    rig.engine.tick(60_000).unwrap();
    rig.engine.tick(120_000).unwrap();
    assert_eq!(rig.transport.call_count(), 1);
    assert_eq!(rig.status_of(&id), OperationStatus::PermanentFailed);
}

#[test]
fn exhausted_retries_end_permanently_failed() {
    let rig = TestRig::with_config(
        EngineConfig::default(),
        OutboxConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                ..Default::default()
            },
            ..Default::default()
        },
    );
    rig.transport.set_default(Rule::retryable_failure("flaky"));
    let id = rig.enqueue(0);

    // Drive time far enough forward each round to clear any backoff.
    let mut now = 0;
    for _ in 0..10 {
        now += 60_000;
        rig.engine.tick(now).unwrap();
        if rig.op(&id).is_terminal() {
            break;
        }
    }

    let op = rig.op(&id);
    assert_eq!(op.status, OperationStatus::PermanentFailed);
    assert_eq!(op.attempt, 3);
    assert_eq!(op.last_error, "retries exhausted");
    assert_eq!(rig.transport.call_count(), 3);

    // And it stays that way.
    rig.engine.tick(now + 60_000).unwrap();
    assert_eq!(rig.transport.call_count(), 3);
}

#[test]
fn kind_rules_apply_when_target_has_none() {
    let rig = TestRig::new();
    rig.transport
        .set_rule_for_kind("http.post", Rule::retryable_failure("kind rule"));

    let id = rig.enqueue(0);
    rig.engine.tick(0).unwrap();
    assert_eq!(rig.op(&id).last_error, "kind rule");

    // A target rule takes precedence over the kind rule.
    rig.transport
        .set_rule_for_target("/api/messages", Rule::success());
    rig.engine.tick(10_000).unwrap();
    assert_eq!(rig.status_of(&id), OperationStatus::Done);
}
