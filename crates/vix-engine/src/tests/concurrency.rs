//! Claim races and the self-driven background loop.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use vix_outbox::{
    FileOutboxStore, FileStoreConfig, Operation, OperationStatus, Outbox, OutboxConfig,
};

use super::harness::TestRig;
use crate::clock::monotonic_now_ms;
use crate::engine::EngineConfig;

#[test]
fn exactly_one_claimant_wins() {
    let dir = TempDir::new().unwrap();
    let store: Arc<FileOutboxStore> = Arc::new(FileOutboxStore::new(FileStoreConfig {
        file_path: dir.path().join("outbox.json"),
        ..Default::default()
    }));

    let outbox = Outbox::new(OutboxConfig::default(), store.clone());
    let id = outbox
        .enqueue(
            Operation {
                kind: "http.post".to_string(),
                ..Default::default()
            },
            0,
        )
        .unwrap();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = store.clone();
        let id = id.clone();
        handles.push(thread::spawn(move || {
            let outbox = Outbox::new(
                OutboxConfig {
                    owner: format!("worker-{}", worker),
                    ..Default::default()
                },
                store,
            );
            outbox.claim(&id, 10).unwrap()
        }));
    }

    let wins: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();
    assert_eq!(wins, 1, "claim must admit exactly one worker");
}

#[test]
fn multiple_workers_split_a_batch_without_double_sends() {
    let rig = TestRig::with_config(
        EngineConfig {
            worker_count: 4,
            ..Default::default()
        },
        OutboxConfig::default(),
    );

    let ids: Vec<String> = (0..8).map(|_| rig.enqueue(0)).collect();
    let processed = rig.engine.tick(0).unwrap();
    assert_eq!(processed, 8);

    // Every op delivered exactly once across all workers.
    assert_eq!(rig.transport.call_count(), 8);
    let mut sent = rig.transport.sent_ids();
    sent.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(sent, expected);
}

#[test]
fn start_and_stop_are_idempotent() {
    let rig = TestRig::new();

    assert!(!rig.engine.running());
    rig.engine.start();
    rig.engine.start();
    assert!(rig.engine.running());

    rig.engine.stop();
    rig.engine.stop();
    assert!(!rig.engine.running());

    // The engine can be started again after a stop.
    rig.engine.start();
    assert!(rig.engine.running());
    rig.engine.stop();
}

#[test]
fn self_driven_engine_delivers_in_the_background() {
    let rig = TestRig::with_config(
        EngineConfig {
            idle_sleep_ms: 5,
            offline_sleep_ms: 5,
            ..Default::default()
        },
        OutboxConfig::default(),
    );

    let id = rig.enqueue(monotonic_now_ms());
    rig.engine.start();

    let deadline = Instant::now() + Duration::from_secs(5);
    while rig.status_of(&id) != OperationStatus::Done {
        assert!(Instant::now() < deadline, "engine never delivered the op");
        thread::sleep(Duration::from_millis(5));
    }

    rig.engine.stop();
    assert!(!rig.engine.running());
    assert!(rig.transport.call_count() >= 1);
}

#[test]
fn drop_stops_the_background_thread() {
    let rig = TestRig::with_config(
        EngineConfig {
            idle_sleep_ms: 5,
            offline_sleep_ms: 5,
            ..Default::default()
        },
        OutboxConfig::default(),
    );
    rig.engine.start();
    assert!(rig.engine.running());
    // Dropping the rig drops the engine, which must join cleanly.
}
