//! Exponential backoff between retries of one model
//!
//! The orchestrator owns the retry loop; this module only answers "how long
//! before the next attempt". A fresh [`RetryBackoff`] is created for every
//! model so the delay grows with the attempt count against that model.

use std::fmt;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts per model after the first (0 means a single attempt)
    pub max_retries: u32,

    /// Initial backoff duration
    pub initial_interval: Duration,

    /// Maximum backoff duration
    pub max_interval: Duration,

    /// Multiplier for backoff between retries
    pub multiplier: f64,

    /// Randomization applied to each interval (0.0 disables jitter)
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_secs(8),
            multiplier: 2.0,
            randomization_factor: 0.2,
        }
    }
}

impl RetryConfig {
    /// Total attempts allowed against one model
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Start a backoff sequence for one model
    pub fn backoff(&self) -> RetryBackoff {
        RetryBackoff::new(self)
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_retries: {}, initial_interval: {:?}, max_interval: {:?}, multiplier: {}, randomization_factor: {} }}",
            self.max_retries,
            self.initial_interval,
            self.max_interval,
            self.multiplier,
            self.randomization_factor
        )
    }
}

/// Backoff sequence for the retries of a single model
#[derive(Debug)]
pub struct RetryBackoff {
    inner: ExponentialBackoff,
    ceiling: Duration,
}

impl RetryBackoff {
    fn new(config: &RetryConfig) -> Self {
        let inner = ExponentialBackoffBuilder::new()
            .with_initial_interval(config.initial_interval)
            .with_max_interval(config.max_interval)
            .with_multiplier(config.multiplier)
            .with_randomization_factor(config.randomization_factor)
            .with_max_elapsed_time(None)
            .build();

        Self {
            inner,
            ceiling: config.max_interval,
        }
    }

    /// Delay before the next retry. Never gives up on its own; the attempt
    /// bound is enforced by the caller.
    pub fn next_delay(&mut self) -> Duration {
        self.inner.next_backoff().unwrap_or(self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_with_attempts() {
        let config = RetryConfig {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(1000),
            randomization_factor: 0.0,
            ..RetryConfig::default()
        };

        let mut backoff = config.backoff();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_max_attempts() {
        let config = RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        };
        assert_eq!(config.max_attempts(), 3);

        let config = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert_eq!(config.max_attempts(), 1);
    }
}
