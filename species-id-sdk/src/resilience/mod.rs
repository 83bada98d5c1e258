//! Resilience patterns for backend calls
//!
//! - [`RateLimiter`]: one shared minimum spacing between outbound requests
//! - [`RetryConfig`] / [`RetryBackoff`]: exponential delays between retries
//!   of the same model

mod rate_limiter;
mod retry;

pub use rate_limiter::RateLimiter;
pub use retry::{RetryBackoff, RetryConfig};
