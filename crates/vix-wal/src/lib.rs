//! Append-only binary write-ahead log.
//!
//! Intents are framed with a fixed 36-byte little-endian header so any
//! external tool can replay the log. The log is a standalone building block:
//! writers append durable records before side effects happen, readers scan
//! forward and stop at the first frame that fails validation (a corrupt or
//! torn tail is end-of-log, not an error).

mod error;
mod reader;
mod record;
mod wal;
mod writer;

pub use error::{WalError, WalResult};
pub use reader::WalReader;
pub use record::{WalRecord, WalRecordType, HEADER_SIZE, MAGIC, VERSION};
pub use wal::{Wal, WalConfig};
pub use writer::{WalWriter, WalWriterConfig};
