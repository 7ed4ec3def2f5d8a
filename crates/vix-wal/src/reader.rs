//! WAL reader: sequential forward scan with explicit reseeking.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::WalResult;
use crate::record::{FrameHeader, WalRecord, HEADER_SIZE};

/// Reads framed records in order.
///
/// The first frame that fails validation (foreign magic, wrong version, or a
/// tail cut short mid-record) ends the scan: `next` returns `Ok(None)` and
/// every later call does too until the cursor is reseeked.
pub struct WalReader {
    file: BufReader<File>,
    /// Next byte to read.
    cursor: i64,
    /// Offset of the record most recently returned.
    offset: i64,
    /// Set once a frame fails validation; cleared by `seek`.
    exhausted: bool,
}

impl WalReader {
    pub fn open(path: impl AsRef<Path>) -> WalResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file: BufReader::new(file),
            cursor: 0,
            offset: 0,
            exhausted: false,
        })
    }

    /// Positions the cursor at an absolute byte offset, normally one
    /// previously returned by a writer's `append`.
    pub fn seek(&mut self, offset: i64) -> WalResult<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.cursor = offset;
        self.offset = offset;
        self.exhausted = false;
        Ok(())
    }

    /// Offset of the record most recently returned by `next`.
    ///
    /// Note this is not the next-to-read position: a caller persisting a
    /// resume point must advance past the returned record's frame before
    /// reseeking, or it will observe that record again.
    pub fn current_offset(&self) -> i64 {
        self.offset
    }

    /// Returns the next record, or `None` at end-of-valid-log.
    pub fn next(&mut self) -> WalResult<Option<WalRecord>> {
        if self.exhausted {
            return Ok(None);
        }

        let start = self.cursor;

        let mut header_buf = [0u8; HEADER_SIZE];
        if !self.read_fully(&mut header_buf)? {
            return Ok(None);
        }

        let Some(header) = FrameHeader::parse(&header_buf) else {
            // Foreign bytes: everything from here on is not ours.
            self.exhausted = true;
            return Ok(None);
        };

        let mut id = vec![0u8; header.id_len];
        let mut payload = vec![0u8; header.payload_len];
        let mut error = vec![0u8; header.error_len];
        if !self.read_fully(&mut id)?
            || !self.read_fully(&mut payload)?
            || !self.read_fully(&mut error)?
        {
            return Ok(None);
        }

        let frame_len = HEADER_SIZE + header.id_len + header.payload_len + header.error_len;
        let record = WalRecord {
            record_type: header.record_type,
            ts_ms: header.ts_ms,
            id: String::from_utf8_lossy(&id).into_owned(),
            payload,
            error: String::from_utf8_lossy(&error).into_owned(),
            next_retry_at_ms: header.next_retry_at_ms,
        };

        self.cursor = start + frame_len as i64;
        self.offset = start;
        Ok(Some(record))
    }

    /// Reads an exact buffer. A short read marks the log exhausted and
    /// returns false; genuine I/O failures propagate.
    fn read_fully(&mut self, buf: &mut [u8]) -> WalResult<bool> {
        match self.file.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
