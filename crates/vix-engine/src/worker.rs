//! One worker's tick: sweep, gate, peek, claim, send, record.

use std::sync::Arc;

use tracing::{debug, warn};
use vix_outbox::{Outbox, OutboxResult};

use crate::probe::ConnectivityProbe;
use crate::transport::{SendOutcome, SyncTransport};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum operations pulled per tick.
    pub batch_limit: usize,
    /// Age beyond which a claimed op is assumed lost and requeued.
    pub inflight_timeout_ms: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_limit: 25,
            inflight_timeout_ms: 10_000,
        }
    }
}

/// What one tick accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// Send attempts made, successful or not. Lost claim races don't count.
    pub processed: usize,
    /// The connectivity gate stopped this tick.
    pub offline: bool,
}

/// Processes ready operations one batch per tick.
///
/// The worker holds no lock across the transport call: exclusive access to
/// an operation comes from the claim transition, and the in-flight timeout
/// sweep recovers claims leaked by a crashed worker.
pub struct SyncWorker {
    cfg: WorkerConfig,
    outbox: Arc<Outbox>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    transport: Option<Arc<dyn SyncTransport>>,
}

impl SyncWorker {
    pub fn new(
        cfg: WorkerConfig,
        outbox: Arc<Outbox>,
        probe: Option<Arc<dyn ConnectivityProbe>>,
        transport: Option<Arc<dyn SyncTransport>>,
    ) -> Self {
        Self {
            cfg,
            outbox,
            probe,
            transport,
        }
    }

    /// Runs one tick at the given time and reports what happened.
    ///
    /// The sweep runs before the connectivity gate so stuck operations are
    /// recovered even through extended offline periods.
    pub fn tick(&self, now_ms: i64) -> OutboxResult<TickOutcome> {
        self.outbox
            .store()
            .requeue_inflight_older_than(now_ms, self.cfg.inflight_timeout_ms)?;

        let online = match &self.probe {
            Some(probe) => probe.refresh(now_ms),
            None => true,
        };
        if !online {
            debug!("offline, skipping tick");
            return Ok(TickOutcome {
                processed: 0,
                offline: true,
            });
        }

        let ops = self.outbox.peek_ready(now_ms, self.cfg.batch_limit)?;
        if ops.is_empty() {
            return Ok(TickOutcome::default());
        }

        let mut processed = 0;
        for op in &ops {
            // Claim to avoid a double send; a lost race just means another
            // worker got there first.
            if !self.outbox.claim(&op.id, now_ms)? {
                continue;
            }

            let outcome = match &self.transport {
                Some(transport) => transport.send(op),
                None => SendOutcome::retryable_failure("No transport configured"),
            };

            if outcome.ok {
                self.outbox.complete(&op.id, now_ms)?;
            } else {
                let error = if outcome.error.is_empty() {
                    "send failed"
                } else {
                    outcome.error.as_str()
                };
                warn!(op_id = %op.id, error = %error, retryable = outcome.retryable, "send failed");
                self.outbox.fail(&op.id, error, now_ms, outcome.retryable)?;
            }

            processed += 1;
        }

        Ok(TickOutcome {
            processed,
            offline: false,
        })
    }
}
