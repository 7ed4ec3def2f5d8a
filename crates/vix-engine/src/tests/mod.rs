//! Scenario tests for the sync engine.
//!
//! - delivery: happy-path sends and batch behavior
//! - offline: the connectivity gate
//! - retry: backoff scheduling, permanent failures, exhaustion
//! - recovery: the in-flight timeout sweep
//! - concurrency: claim races and the self-driven background loop

mod concurrency;
mod retry;
