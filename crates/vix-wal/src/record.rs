//! WAL record type and its binary frame.
//!
//! Wire format, little-endian:
//!
//! ```text
//! [4: magic "VIXW"][2: version][1: type][1: reserved=0]
//! [8: ts_ms][4: id_len][4: payload_len][4: error_len][8: next_retry_at_ms]
//! [id bytes][payload bytes][error bytes]
//! ```

/// Magic number at the start of every frame: "VIXW".
pub const MAGIC: u32 = 0x5649_5857;

/// Current frame version. Increment on breaking layout changes.
pub const VERSION: u16 = 1;

/// Fixed frame header size in bytes.
pub const HEADER_SIZE: usize = 4 + 2 + 1 + 1 + 8 + 4 + 4 + 4 + 8;

/// Kind of durable intent a record describes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalRecordType {
    /// An operation was persisted or updated.
    PutOperation = 1,
    /// An operation completed.
    MarkDone = 2,
    /// An operation recorded a failure.
    MarkFailed = 3,
}

impl WalRecordType {
    /// Convert from the wire byte. Unknown codes are invalid frames.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::PutOperation),
            2 => Some(Self::MarkDone),
            3 => Some(Self::MarkFailed),
            _ => None,
        }
    }
}

/// One append-only log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub record_type: WalRecordType,
    pub ts_ms: i64,
    /// Operation id the entry refers to.
    pub id: String,
    /// Opaque payload (typically the serialized operation).
    pub payload: Vec<u8>,
    /// Error message for failure records; empty otherwise.
    pub error: String,
    pub next_retry_at_ms: i64,
}

impl WalRecord {
    /// Encode the full frame (header plus variable-length body).
    pub fn encode(&self) -> Vec<u8> {
        let id_len = self.id.len() as u32;
        let payload_len = self.payload.len() as u32;
        let error_len = self.error.len() as u32;

        let mut buf =
            Vec::with_capacity(HEADER_SIZE + self.id.len() + self.payload.len() + self.error.len());

        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.push(self.record_type as u8);
        buf.push(0); // reserved
        buf.extend_from_slice(&self.ts_ms.to_le_bytes());
        buf.extend_from_slice(&id_len.to_le_bytes());
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&error_len.to_le_bytes());
        buf.extend_from_slice(&self.next_retry_at_ms.to_le_bytes());

        buf.extend_from_slice(self.id.as_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(self.error.as_bytes());

        buf
    }

    /// Total encoded size of this record's frame.
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.id.len() + self.payload.len() + self.error.len()
    }
}

/// Parsed fixed-size header fields.
pub(crate) struct FrameHeader {
    pub record_type: WalRecordType,
    pub ts_ms: i64,
    pub id_len: usize,
    pub payload_len: usize,
    pub error_len: usize,
    pub next_retry_at_ms: i64,
}

impl FrameHeader {
    /// Parse a header buffer. `None` means the frame is not a valid record
    /// of this version (the reader treats that as end-of-log).
    pub(crate) fn parse(buf: &[u8; HEADER_SIZE]) -> Option<Self> {
        let magic = u32::from_le_bytes(buf[0..4].try_into().ok()?);
        let version = u16::from_le_bytes(buf[4..6].try_into().ok()?);
        if magic != MAGIC || version != VERSION {
            return None;
        }

        let record_type = WalRecordType::from_u8(buf[6])?;
        let ts_ms = i64::from_le_bytes(buf[8..16].try_into().ok()?);
        let id_len = u32::from_le_bytes(buf[16..20].try_into().ok()?) as usize;
        let payload_len = u32::from_le_bytes(buf[20..24].try_into().ok()?) as usize;
        let error_len = u32::from_le_bytes(buf[24..28].try_into().ok()?) as usize;
        let next_retry_at_ms = i64::from_le_bytes(buf[28..36].try_into().ok()?);

        Some(Self {
            record_type,
            ts_ms,
            id_len,
            payload_len,
            error_len,
            next_retry_at_ms,
        })
    }
}
