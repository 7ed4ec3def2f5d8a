//! WAL error types.

use thiserror::Error;

/// WAL error type.
///
/// Only structural I/O surfaces as an error. A corrupt frame (bad magic,
/// wrong version, short read) is reported by the reader as end-of-log.
#[derive(Error, Debug)]
pub enum WalError {
    /// The log cannot be opened, written, or positioned.
    #[error("WAL I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using WalError.
pub type WalResult<T> = Result<T, WalError>;
