//! Sync engine for the durable outbox.
//!
//! This crate provides:
//! - `SyncTransport` / `ConnectivityProbe`: the two capabilities the host
//!   supplies (how to send, and whether the link is up)
//! - `SyncWorker`: one tick of the sweep/gate/peek/claim/send/record loop
//! - `SyncEngine`: owns the workers; drive it manually with `tick(now_ms)`
//!   or let it run its own background thread via `start`/`stop`
//!
//! Workers never sleep and never retry within a tick; backoff happens
//! between ticks through each operation's retry schedule.

mod clock;
mod engine;
mod probe;
mod transport;
mod worker;

#[cfg(test)]
mod tests;

pub use clock::monotonic_now_ms;
pub use engine::{EngineConfig, SyncEngine};
pub use probe::ConnectivityProbe;
pub use transport::{SendOutcome, SyncTransport};
pub use worker::{SyncWorker, TickOutcome, WorkerConfig};
