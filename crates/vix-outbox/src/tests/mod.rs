//! Scenario tests for the outbox crate.
//!
//! - durability: snapshot save/load behavior of the file store
//! - lifecycle: store state transitions and their boundaries
//! - facade: outbox-level minting, retry scheduling, and failure paths


use std::sync::Arc;

use tempfile::TempDir;

use crate::{FileOutboxStore, FileStoreConfig, Operation, Outbox, OutboxConfig};

/// A file store writing under a fresh temp dir. The dir guard must be kept
/// alive for the duration of the test.
pub(crate) fn temp_store(dir: &TempDir) -> Arc<FileOutboxStore> {
    Arc::new(FileOutboxStore::new(FileStoreConfig {
        file_path: dir.path().join("outbox.json"),
        ..Default::default()
    }))
}

pub(crate) fn temp_outbox(dir: &TempDir) -> Outbox {
    Outbox::new(OutboxConfig::default(), temp_store(dir))
}

/// A pending operation with deterministic identity fields.
pub(crate) fn sample_op(id: &str) -> Operation {
    Operation {
        id: id.to_string(),
        kind: "http.post".to_string(),
        target: "/api/messages".to_string(),
        payload: r#"{"text":"hello offline"}"#.to_string(),
        idempotency_key: format!("idem-{}", id),
        ..Default::default()
    }
}
