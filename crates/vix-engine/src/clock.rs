//! Monotonic time source for the self-driven engine loop.

use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Milliseconds on a process-wide monotonic clock.
///
/// Only the engine's background loop reads this; every other entry point
/// takes `now_ms` explicitly so callers (and tests) control time.
pub fn monotonic_now_ms() -> i64 {
    let anchor = *ANCHOR.get_or_init(Instant::now);
    Instant::now().duration_since(anchor).as_millis() as i64
}
