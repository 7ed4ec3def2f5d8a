//! The persistence contract behind the outbox.

use crate::error::OutboxResult;
use crate::operation::Operation;

/// Filters for [`OutboxStore::list`].
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Stop after this many operations.
    pub limit: usize,
    /// Reference time for the readiness filter.
    pub now_ms: i64,
    /// Only return ops whose `next_retry_at_ms <= now_ms`.
    pub only_ready: bool,
    /// Include InFlight ops (usually false).
    pub include_inflight: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: 50,
            now_ms: 0,
            only_ready: true,
            include_inflight: false,
        }
    }
}

/// Durable storage for operations.
///
/// Each method is a single linearization point with respect to the others;
/// an in-process implementation serializes them behind one mutex. Durable
/// commit happens before the method returns unless the implementation's
/// configuration explicitly relaxes it.
///
/// The `attempt` counter is incremented here, in `mark_failed`,
/// `mark_permanent_failed`, and `requeue_inflight_older_than`, so every
/// recorded failure is visible in the counter regardless of origin.
pub trait OutboxStore: Send + Sync {
    /// Upserts an operation by id.
    fn put(&self, op: &Operation) -> OutboxResult<()>;

    /// Fetches an operation by id.
    fn get(&self, id: &str) -> OutboxResult<Option<Operation>>;

    /// Returns candidates for sending. `Done` and `PermanentFailed` are
    /// never returned.
    fn list(&self, opt: &ListOptions) -> OutboxResult<Vec<Operation>>;

    /// Reserves an operation for one worker: Pending/Failed -> InFlight,
    /// records `owner`, stamps `now_ms`. Returns false for any other state
    /// or an unknown id; the caller lost the race and must skip.
    fn claim(&self, id: &str, owner: &str, now_ms: i64) -> OutboxResult<bool>;

    /// InFlight -> Done. Clears `last_error` and the owner.
    fn mark_done(&self, id: &str, now_ms: i64) -> OutboxResult<bool>;

    /// Records a retryable failure: increments `attempt`, sets Failed,
    /// `last_error`, and the next eligible send time. Clears the owner.
    fn mark_failed(
        &self,
        id: &str,
        error: &str,
        now_ms: i64,
        next_retry_at_ms: i64,
    ) -> OutboxResult<bool>;

    /// Records a non-retryable failure: increments `attempt`, sets
    /// PermanentFailed and `last_error`. Clears the owner.
    fn mark_permanent_failed(&self, id: &str, error: &str, now_ms: i64) -> OutboxResult<bool>;

    /// Removes Done operations whose `updated_at_ms <= older_than_ms`.
    /// Returns the number removed.
    fn prune_done(&self, older_than_ms: i64) -> OutboxResult<usize>;

    /// Recovers operations stranded by crashed or stuck workers: every
    /// InFlight op with `now_ms - updated_at_ms >= timeout_ms` is marked
    /// Failed with an incremented attempt and `next_retry_at_ms = now_ms`.
    /// Returns the number requeued.
    fn requeue_inflight_older_than(&self, now_ms: i64, timeout_ms: i64) -> OutboxResult<usize>;
}
