//! The sync engine: owns the workers and optionally drives them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};
use vix_outbox::{Outbox, OutboxResult};

use crate::clock::monotonic_now_ms;
use crate::probe::ConnectivityProbe;
use crate::transport::SyncTransport;
use crate::worker::{SyncWorker, WorkerConfig};

/// Engine configuration. All durations are milliseconds.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of workers stepped per tick.
    pub worker_count: usize,
    /// Background-loop sleep when a tick processed nothing.
    pub idle_sleep_ms: u64,
    /// Background-loop sleep when every worker reported offline.
    pub offline_sleep_ms: u64,
    /// Maximum operations each worker pulls per tick.
    pub batch_limit: usize,
    /// Age beyond which a claimed op is assumed lost and requeued.
    pub inflight_timeout_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            idle_sleep_ms: 250,
            offline_sleep_ms: 500,
            batch_limit: 25,
            inflight_timeout_ms: 10_000,
        }
    }
}

/// Coordinator for the offline-first sync loop.
///
/// Two usage modes, one at a time:
/// - embedded: the host calls [`tick`](Self::tick) on its own schedule and
///   supplies the clock;
/// - self-driven: [`start`](Self::start) spawns one background thread that
///   ticks on the process monotonic clock until [`stop`](Self::stop).
///
/// `tick` must not be called concurrently with the background thread.
pub struct SyncEngine {
    cfg: EngineConfig,
    workers: Arc<Vec<SyncWorker>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(
        cfg: EngineConfig,
        outbox: Arc<Outbox>,
        probe: Option<Arc<dyn ConnectivityProbe>>,
        transport: Option<Arc<dyn SyncTransport>>,
    ) -> Self {
        let worker_cfg = WorkerConfig {
            batch_limit: cfg.batch_limit,
            inflight_timeout_ms: cfg.inflight_timeout_ms,
        };

        let workers = (0..cfg.worker_count)
            .map(|_| {
                SyncWorker::new(
                    worker_cfg.clone(),
                    outbox.clone(),
                    probe.clone(),
                    transport.clone(),
                )
            })
            .collect();

        Self {
            cfg,
            workers: Arc::new(workers),
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Steps every worker once at the given time; returns the total number
    /// of send attempts.
    pub fn tick(&self, now_ms: i64) -> OutboxResult<usize> {
        let mut total = 0;
        for worker in self.workers.iter() {
            total += worker.tick(now_ms)?.processed;
        }
        Ok(total)
    }

    /// Starts the background loop. Idempotent.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let cfg = self.cfg.clone();
        let workers = self.workers.clone();
        let running = self.running.clone();

        let handle = thread::Builder::new()
            .name("vix-sync-engine".to_string())
            .spawn(move || run_loop(cfg, workers, running))
            .expect("failed to spawn sync engine thread");

        *self.handle.lock().expect("engine handle lock poisoned") = Some(handle);
        info!("sync engine started");
    }

    /// Stops the background loop and joins the thread. Idempotent. Any
    /// transport send already underway completes first.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self
            .handle
            .lock()
            .expect("engine handle lock poisoned")
            .take()
        {
            let _ = handle.join();
        }
        info!("sync engine stopped");
    }

    /// Whether the background loop is running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background loop: tick, then pace by what the tick reported.
fn run_loop(cfg: EngineConfig, workers: Arc<Vec<SyncWorker>>, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        let now_ms = monotonic_now_ms();

        let mut processed = 0;
        let mut all_offline = !workers.is_empty();
        let mut errored = false;

        for worker in workers.iter() {
            match worker.tick(now_ms) {
                Ok(outcome) => {
                    processed += outcome.processed;
                    if !outcome.offline {
                        all_offline = false;
                    }
                }
                Err(err) => {
                    // The loop must outlive store hiccups; pace down and
                    // try again next tick.
                    warn!(error = %err, "sync tick failed");
                    errored = true;
                    all_offline = false;
                }
            }
        }

        if all_offline {
            thread::sleep(Duration::from_millis(cfg.offline_sleep_ms));
        } else if processed == 0 || errored {
            thread::sleep(Duration::from_millis(cfg.idle_sleep_ms));
        } else {
            thread::yield_now();
        }
    }
}
