//! The outbox coordinator.
//!
//! The store persists mutations; the outbox chooses which mutation to apply.
//! Failure handling consults the retry policy: retryable failures get a
//! backoff schedule, non-retryable and retry-exhausted failures become
//! permanent.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::OutboxResult;
use crate::operation::Operation;
use crate::retry::RetryPolicy;
use crate::store::{ListOptions, OutboxStore};

/// Error recorded when the retry policy runs out of attempts.
const RETRIES_EXHAUSTED_ERROR: &str = "retries exhausted";

/// Outbox configuration.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Identifies this sync instance in the store's owner map.
    pub owner: String,
    pub retry: RetryPolicy,
    /// Mint an id on enqueue when the caller left it empty.
    pub auto_generate_ids: bool,
    /// Mint an idempotency key on enqueue when the caller left it empty.
    pub auto_generate_idempotency_key: bool,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            owner: "vix-sync".to_string(),
            retry: RetryPolicy::default(),
            auto_generate_ids: true,
            auto_generate_idempotency_key: true,
        }
    }
}

/// Coordinates durable state transitions over one shared store.
pub struct Outbox {
    cfg: OutboxConfig,
    store: Arc<dyn OutboxStore>,
}

impl Outbox {
    pub fn new(cfg: OutboxConfig, store: Arc<dyn OutboxStore>) -> Self {
        Self { cfg, store }
    }

    pub fn config(&self) -> &OutboxConfig {
        &self.cfg
    }

    /// The store shared with this outbox.
    pub fn store(&self) -> Arc<dyn OutboxStore> {
        self.store.clone()
    }

    /// Persists an intent to deliver and returns its effective id.
    ///
    /// Missing identity fields are minted (when configured) and zero
    /// timestamps default to `now_ms`, so a caller only has to fill in the
    /// intent itself.
    pub fn enqueue(&self, mut op: Operation, now_ms: i64) -> OutboxResult<String> {
        if self.cfg.auto_generate_ids && op.id.is_empty() {
            op.id = make_id();
        }
        if self.cfg.auto_generate_idempotency_key && op.idempotency_key.is_empty() {
            op.idempotency_key = make_idempotency_key();
        }

        if op.created_at_ms == 0 {
            op.created_at_ms = now_ms;
        }
        op.updated_at_ms = now_ms;
        if op.next_retry_at_ms == 0 {
            op.next_retry_at_ms = now_ms;
        }

        self.store.put(&op)?;
        debug!(op_id = %op.id, kind = %op.kind, "enqueued operation");
        Ok(op.id)
    }

    /// Operations eligible to be claimed at `now_ms`, in no particular order.
    pub fn peek_ready(&self, now_ms: i64, limit: usize) -> OutboxResult<Vec<Operation>> {
        self.store.list(&ListOptions {
            limit,
            now_ms,
            only_ready: true,
            include_inflight: false,
        })
    }

    /// Reserves an operation for this outbox's configured owner.
    pub fn claim(&self, id: &str, now_ms: i64) -> OutboxResult<bool> {
        self.store.claim(id, &self.cfg.owner, now_ms)
    }

    /// Records a successful delivery.
    pub fn complete(&self, id: &str, now_ms: i64) -> OutboxResult<bool> {
        self.store.mark_done(id, now_ms)
    }

    /// Records a failed delivery attempt.
    ///
    /// Non-retryable failures and failures past the policy's attempt budget
    /// are permanent; everything else is scheduled for a future retry. The
    /// store increments the attempt counter as part of the mutation.
    pub fn fail(&self, id: &str, error: &str, now_ms: i64, retryable: bool) -> OutboxResult<bool> {
        let Some(op) = self.store.get(id)? else {
            return Ok(false);
        };

        let next_attempt = op.attempt + 1;

        if !retryable {
            warn!(op_id = %id, error = %error, "operation permanently failed");
            return self.store.mark_permanent_failed(id, error, now_ms);
        }

        if !self.cfg.retry.can_retry(next_attempt) {
            warn!(op_id = %id, attempts = next_attempt, "operation exhausted its retries");
            return self
                .store
                .mark_permanent_failed(id, RETRIES_EXHAUSTED_ERROR, now_ms);
        }

        let delay = self.cfg.retry.delay_ms(next_attempt);
        debug!(op_id = %id, attempt = next_attempt, delay_ms = delay, "scheduled retry");
        self.store.mark_failed(id, error, now_ms, now_ms + delay)
    }

    /// Removes Done operations older than the threshold. Returns the number
    /// removed.
    pub fn prune_done(&self, older_than_ms: i64) -> OutboxResult<usize> {
        self.store.prune_done(older_than_ms)
    }
}

fn make_id() -> String {
    format!("op_{}", Uuid::new_v4().simple())
}

fn make_idempotency_key() -> String {
    format!("idem_{}", Uuid::new_v4().simple())
}
