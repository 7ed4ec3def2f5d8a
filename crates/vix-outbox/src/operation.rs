//! The durable operation record and its lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an operation.
///
/// Persisted as an integer code: `0=Pending, 1=InFlight, 2=Done, 3=Failed,
/// 4=PermanentFailed`. `Done` and `PermanentFailed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum OperationStatus {
    /// Enqueued, waiting for a worker.
    #[default]
    Pending = 0,
    /// Claimed by a worker; a send attempt is in progress.
    InFlight = 1,
    /// Accepted by the remote. Terminal.
    Done = 2,
    /// A retryable failure was recorded; eligible again at `next_retry_at_ms`.
    Failed = 3,
    /// A non-retryable failure was recorded. Terminal.
    PermanentFailed = 4,
}

impl From<OperationStatus> for u8 {
    fn from(status: OperationStatus) -> u8 {
        status as u8
    }
}

impl TryFrom<u8> for OperationStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Pending),
            1 => Ok(Self::InFlight),
            2 => Ok(Self::Done),
            3 => Ok(Self::Failed),
            4 => Ok(Self::PermanentFailed),
            other => Err(format!("unknown operation status code: {}", other)),
        }
    }
}

/// The durable unit of intent to deliver.
///
/// Every field defaults on load so snapshots written by older versions (or
/// with fields elided) still deserialize.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Operation {
    /// Unique id; minted on enqueue when empty.
    #[serde(default)]
    pub id: String,
    /// Routing hint for transport/rule matching (e.g. "http.post").
    #[serde(default)]
    pub kind: String,
    /// Destination, e.g. a URL or peer id.
    #[serde(default)]
    pub target: String,
    /// Opaque payload, transport-defined.
    #[serde(default)]
    pub payload: String,
    /// Stable across retries; minted on enqueue when empty.
    #[serde(default)]
    pub idempotency_key: String,
    /// Set on first enqueue.
    #[serde(default)]
    pub created_at_ms: i64,
    /// Updated on every transition.
    #[serde(default)]
    pub updated_at_ms: i64,
    /// Incremented on every recorded failure.
    #[serde(default)]
    pub attempt: u32,
    /// Earliest time the operation is eligible for a send.
    #[serde(default)]
    pub next_retry_at_ms: i64,
    #[serde(default)]
    pub status: OperationStatus,
    /// Empty unless status is Failed or PermanentFailed.
    #[serde(default)]
    pub last_error: String,
}

impl Operation {
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == OperationStatus::InFlight
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    pub fn is_failed(&self) -> bool {
        self.status == OperationStatus::Failed
    }

    /// Terminal operations never transition again and are never listed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OperationStatus::Done | OperationStatus::PermanentFailed
        )
    }
}
