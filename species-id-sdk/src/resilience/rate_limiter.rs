//! Minimum-interval rate limiter
//!
//! A single limiter is shared by every model in the pool. Concurrent callers
//! queue on the inner lock, so all outbound requests of one orchestrator are
//! spaced by at least the configured interval.

use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum spacing between outbound requests
#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Completion time of the previous `wait`
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter that has never fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend until `min_interval` has passed since the previous call
    /// returned, then record the new timestamp.
    ///
    /// The delay and the timestamp update are separate steps under one lock.
    /// If the caller is dropped while sleeping, the old timestamp stays.
    pub async fn wait(&self, min_interval: Duration) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!("Rate limiter delaying request by {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }

    /// Time of the most recent completed `wait`, if any
    pub async fn last_call(&self) -> Option<Instant> {
        *self.last_call.lock().await
    }
}
