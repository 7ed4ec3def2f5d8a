//! The send capability supplied by the host.

use vix_outbox::Operation;

/// Result of one delivery attempt.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The remote accepted the operation.
    pub ok: bool,
    /// On failure: whether the outbox may try again. `false` marks the
    /// operation permanently failed.
    pub retryable: bool,
    /// Error message recorded on the operation; empty on success.
    pub error: String,
}

impl SendOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            retryable: true,
            error: String::new(),
        }
    }

    pub fn retryable_failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            retryable: true,
            error: error.into(),
        }
    }

    pub fn permanent_failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            retryable: false,
            error: error.into(),
        }
    }
}

/// Performs the actual delivery (HTTP, WebSocket, P2P, ...).
///
/// `send` may block on network I/O; the calling worker holds no store lock
/// while it runs.
pub trait SyncTransport: Send + Sync {
    fn send(&self, op: &Operation) -> SendOutcome;
}
