//! Outbox error types.

use thiserror::Error;

/// Outbox error type.
///
/// Structural I/O failures propagate to the caller; domain-level failures
/// (a send that did not succeed) are recorded on the operation itself and
/// never surface as errors.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// The store cannot read or write its durable representation.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file cannot be encoded or decoded.
    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
