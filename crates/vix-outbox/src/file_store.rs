//! JSON-snapshot store for client-side outbox sizes.
//!
//! Holds the full operation set in memory behind one mutex, lazily loads it
//! from a snapshot file on first access, and rewrites the whole snapshot on
//! every mutation. The rewrite goes through a temp file plus rename, so a
//! crash mid-flush leaves either the old snapshot or the new one on disk,
//! never a torn view.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::OutboxResult;
use crate::operation::{Operation, OperationStatus};
use crate::store::{ListOptions, OutboxStore};

/// Error recorded when the in-flight timeout sweep requeues an operation.
pub(crate) const INFLIGHT_TIMEOUT_ERROR: &str = "requeued after inflight timeout";

/// File store configuration.
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Snapshot file location. Parent directories are created on flush.
    pub file_path: PathBuf,
    /// Write indented JSON (useful when inspecting the file by hand).
    pub pretty_json: bool,
    /// Call fsync after every flush. Slower, safer.
    pub fsync_on_write: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("./.vix/outbox.json"),
            pretty_json: false,
            fsync_on_write: false,
        }
    }
}

/// On-disk snapshot layout.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    ops: HashMap<String, Operation>,
    #[serde(default)]
    owners: HashMap<String, String>,
}

#[derive(Default)]
struct Inner {
    loaded: bool,
    ops: HashMap<String, Operation>,
    owners: HashMap<String, String>,
}

/// File-backed [`OutboxStore`].
///
/// A single process owns the snapshot file; there is no cross-process
/// locking.
pub struct FileOutboxStore {
    cfg: FileStoreConfig,
    inner: Mutex<Inner>,
}

impl FileOutboxStore {
    pub fn new(cfg: FileStoreConfig) -> Self {
        Self {
            cfg,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Loads the snapshot on first access. A missing file is an empty store.
    fn load_if_needed(&self, inner: &mut Inner) -> OutboxResult<()> {
        if inner.loaded {
            return Ok(());
        }

        match fs::read(&self.cfg.file_path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                inner.ops = snapshot.ops;
                inner.owners = snapshot.owners;
                debug!(
                    path = %self.cfg.file_path.display(),
                    ops = inner.ops.len(),
                    "loaded outbox snapshot"
                );
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        inner.loaded = true;
        Ok(())
    }

    /// Rewrites the whole snapshot: temp file, optional fsync, rename.
    fn flush(&self, inner: &Inner) -> OutboxResult<()> {
        if let Some(parent) = self.cfg.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = Snapshot {
            version: 1,
            ops: inner.ops.clone(),
            owners: inner.owners.clone(),
        };

        let bytes = if self.cfg.pretty_json {
            serde_json::to_vec_pretty(&snapshot)?
        } else {
            serde_json::to_vec(&snapshot)?
        };

        let tmp_path = tmp_sibling(&self.cfg.file_path);
        let mut file = fs::File::create(&tmp_path)?;
        if let Err(err) = write_and_rename(&mut file, &bytes, &tmp_path, &self.cfg) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_and_rename(
    file: &mut fs::File,
    bytes: &[u8],
    tmp_path: &Path,
    cfg: &FileStoreConfig,
) -> std::io::Result<()> {
    file.write_all(bytes)?;
    if cfg.fsync_on_write {
        file.sync_all()?;
    }
    fs::rename(tmp_path, &cfg.file_path)
}

impl OutboxStore for FileOutboxStore {
    fn put(&self, op: &Operation) -> OutboxResult<()> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        inner.ops.insert(op.id.clone(), op.clone());
        self.flush(&inner)
    }

    fn get(&self, id: &str) -> OutboxResult<Option<Operation>> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        Ok(inner.ops.get(id).cloned())
    }

    fn list(&self, opt: &ListOptions) -> OutboxResult<Vec<Operation>> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let mut out = Vec::new();
        for op in inner.ops.values() {
            if out.len() >= opt.limit {
                break;
            }
            if op.is_terminal() {
                continue;
            }
            if !opt.include_inflight && op.is_in_flight() {
                continue;
            }
            if opt.only_ready && op.next_retry_at_ms > opt.now_ms {
                continue;
            }
            out.push(op.clone());
        }

        Ok(out)
    }

    fn claim(&self, id: &str, owner: &str, now_ms: i64) -> OutboxResult<bool> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let Some(op) = inner.ops.get_mut(id) else {
            return Ok(false);
        };

        // The claim is the exclusion point between workers: only an
        // unreserved, non-terminal op may transition to InFlight.
        if !matches!(
            op.status,
            OperationStatus::Pending | OperationStatus::Failed
        ) {
            return Ok(false);
        }

        op.status = OperationStatus::InFlight;
        op.updated_at_ms = now_ms;
        inner.owners.insert(id.to_string(), owner.to_string());
        self.flush(&inner)?;
        Ok(true)
    }

    fn mark_done(&self, id: &str, now_ms: i64) -> OutboxResult<bool> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let Some(op) = inner.ops.get_mut(id) else {
            return Ok(false);
        };

        op.status = OperationStatus::Done;
        op.updated_at_ms = now_ms;
        op.last_error.clear();

        inner.owners.remove(id);
        self.flush(&inner)?;
        Ok(true)
    }

    fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> OutboxResult<bool> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let Some(op) = inner.ops.get_mut(id) else {
            return Ok(false);
        };

        op.attempt += 1;
        op.status = OperationStatus::Failed;
        op.last_error = error.to_string();
        op.updated_at_ms = now_ms;
        op.next_retry_at_ms = next_retry_at_ms;

        inner.owners.remove(id);
        self.flush(&inner)?;
        Ok(true)
    }

    fn mark_permanent_failed(&self, id: &str, error: &str, now_ms: i64) -> OutboxResult<bool> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let Some(op) = inner.ops.get_mut(id) else {
            return Ok(false);
        };

        op.attempt += 1;
        op.status = OperationStatus::PermanentFailed;
        op.last_error = error.to_string();
        op.updated_at_ms = now_ms;
        op.next_retry_at_ms = now_ms;

        inner.owners.remove(id);
        self.flush(&inner)?;
        Ok(true)
    }

    fn prune_done(&self, older_than_ms: i64) -> OutboxResult<usize> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let doomed: Vec<String> = inner
            .ops
            .iter()
            .filter(|(_, op)| op.is_done() && op.updated_at_ms <= older_than_ms)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &doomed {
            inner.ops.remove(id);
            inner.owners.remove(id);
        }

        if !doomed.is_empty() {
            self.flush(&inner)?;
            debug!(removed = doomed.len(), "pruned completed operations");
        }

        Ok(doomed.len())
    }

    fn requeue_inflight_older_than(&self, now_ms: i64, timeout_ms: i64) -> OutboxResult<usize> {
        let mut inner = self.inner.lock().expect("outbox store lock poisoned");
        self.load_if_needed(&mut inner)?;

        let mut requeued = Vec::new();
        for (id, op) in inner.ops.iter_mut() {
            if !op.is_in_flight() {
                continue;
            }
            // An op aged exactly to the timeout is eligible.
            if now_ms - op.updated_at_ms < timeout_ms {
                continue;
            }

            op.attempt += 1;
            op.status = OperationStatus::Failed;
            op.updated_at_ms = now_ms;
            op.next_retry_at_ms = now_ms;
            op.last_error = INFLIGHT_TIMEOUT_ERROR.to_string();
            requeued.push(id.clone());
        }

        for id in &requeued {
            inner.owners.remove(id);
        }

        if !requeued.is_empty() {
            self.flush(&inner)?;
            info!(count = requeued.len(), "requeued stale in-flight operations");
        }

        Ok(requeued.len())
    }
}
