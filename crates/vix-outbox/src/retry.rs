//! Retry policy: deterministic exponential backoff.

/// Decides whether a failed operation may retry and how long to wait.
///
/// The policy is a pure function of the attempt counter, so the schedule is
/// recomputable during recovery from nothing but persisted state.
/// `jitter_ratio` is advisory for callers that want to spread load; the
/// policy itself never randomizes.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after which the operation is considered exhausted.
    pub max_attempts: u32,
    /// Delay floor, and the delay for attempt 0.
    pub base_delay_ms: i64,
    /// Delay ceiling.
    pub max_delay_ms: i64,
    /// Exponential factor: delay = base * factor^attempt.
    pub factor: f64,
    /// 0.0 = none, 0.2 = +/-20%. Applied by callers, if at all.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            factor: 2.0,
            jitter_ratio: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Whether another attempt is permitted after `attempt` recorded failures.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the next send, in milliseconds.
    ///
    /// `attempt` counts recorded failures: 0 yields the base delay. Growth
    /// saturates at `max_delay_ms`; the result is always within
    /// `[base_delay_ms, max_delay_ms]`.
    pub fn delay_ms(&self, attempt: u32) -> i64 {
        let ceiling = self.max_delay_ms as f64;
        let mut delay = self.base_delay_ms as f64;

        for _ in 0..attempt {
            delay *= self.factor;
            if delay >= ceiling {
                return self.max_delay_ms;
            }
        }

        (delay as i64).clamp(self.base_delay_ms, self.max_delay_ms)
    }
}
