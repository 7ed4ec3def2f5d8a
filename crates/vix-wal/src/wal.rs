//! Convenience log handle: one-shot appends and replay.

use std::path::PathBuf;

use crate::error::WalResult;
use crate::reader::WalReader;
use crate::record::WalRecord;
use crate::writer::{WalWriter, WalWriterConfig};

/// Log configuration.
#[derive(Debug, Clone)]
pub struct WalConfig {
    pub file_path: PathBuf,
    pub fsync_on_write: bool,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("./.vix/wal.log"),
            fsync_on_write: false,
        }
    }
}

/// A log handle that opens the file per call.
///
/// Suitable for low-frequency intents; hold a [`WalWriter`] directly when
/// appending in a loop.
pub struct Wal {
    cfg: WalConfig,
}

impl Wal {
    pub fn new(cfg: WalConfig) -> Self {
        Self { cfg }
    }

    /// Appends one record, returning the offset where its header begins.
    pub fn append(&self, rec: &WalRecord) -> WalResult<i64> {
        let mut writer = WalWriter::open(WalWriterConfig {
            file_path: self.cfg.file_path.clone(),
            fsync_on_write: self.cfg.fsync_on_write,
        })?;
        writer.append(rec)
    }

    /// Replays records starting at `from_offset`, invoking `on_record` for
    /// each. Returns the offset of the last record visited, or -1 when the
    /// range held none.
    pub fn replay(
        &self,
        from_offset: i64,
        mut on_record: impl FnMut(&WalRecord),
    ) -> WalResult<i64> {
        let mut reader = WalReader::open(&self.cfg.file_path)?;
        reader.seek(from_offset)?;

        let mut last = -1;
        while let Some(record) = reader.next()? {
            on_record(&record);
            last = reader.current_offset();
        }
        Ok(last)
    }
}
