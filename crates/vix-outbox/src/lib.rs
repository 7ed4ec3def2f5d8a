//! Durable outbox for offline-first delivery.
//!
//! This crate provides:
//! - `Operation`: the durable unit of intent with its lifecycle state
//! - `RetryPolicy`: deterministic exponential backoff
//! - `OutboxStore`: the persistence contract behind the outbox
//! - `FileOutboxStore`: a JSON-snapshot store for client-side use
//! - `Outbox`: the coordinator that chooses which durable transition to apply
//!
//! All time values are externally supplied monotonic milliseconds, so every
//! state transition is deterministic and testable without a real clock.

mod error;
mod file_store;
mod operation;
mod outbox;
mod retry;
mod store;

#[cfg(test)]
mod tests;

pub use error::{OutboxError, OutboxResult};
pub use file_store::{FileOutboxStore, FileStoreConfig};
pub use operation::{Operation, OperationStatus};
pub use outbox::{Outbox, OutboxConfig};
pub use retry::RetryPolicy;
pub use store::{ListOptions, OutboxStore};
