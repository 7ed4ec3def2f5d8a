//! The connectivity capability supplied by the host.

/// Answers "is the network usable for this tick?".
///
/// `refresh` receives the tick's time so implementations can throttle real
/// probing and serve a cached answer in between.
pub trait ConnectivityProbe: Send + Sync {
    fn refresh(&self, now_ms: i64) -> bool;
}
