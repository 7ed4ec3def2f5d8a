//! WAL writer: append-only, flushed after every record.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::trace;

use crate::error::WalResult;
use crate::record::WalRecord;

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WalWriterConfig {
    pub file_path: PathBuf,
    /// Call fsync after every append. Slower, safer.
    pub fsync_on_write: bool,
}

impl Default for WalWriterConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("./.vix/wal.log"),
            fsync_on_write: false,
        }
    }
}

/// Appends framed records to the end of the log file.
pub struct WalWriter {
    cfg: WalWriterConfig,
    file: File,
}

impl WalWriter {
    /// Opens the log for appending, creating parent directories and the file
    /// itself as needed.
    pub fn open(cfg: WalWriterConfig) -> WalResult<Self> {
        if let Some(parent) = cfg.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.file_path)?;

        Ok(Self { cfg, file })
    }

    /// Appends one record and returns the byte offset at which its header
    /// begins. The record is flushed before returning; it is additionally
    /// fsynced when the writer is configured for it.
    pub fn append(&mut self, rec: &WalRecord) -> WalResult<i64> {
        let offset = self.file.seek(SeekFrom::End(0))? as i64;

        self.file.write_all(&rec.encode())?;
        self.file.flush()?;
        if self.cfg.fsync_on_write {
            self.file.sync_all()?;
        }

        trace!(offset, id = %rec.id, "appended WAL record");
        Ok(offset)
    }
}
