//! Tests for resilience patterns
//!
//! The tokio clock is paused, so sleeps complete instantly while elapsed
//! time is still measured exactly.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::Instant;

    use crate::backend::AttemptOutcome;
    use crate::error::{AttemptFailure, NextStep, TransientCause};
    use crate::resilience::{RateLimiter, RetryConfig};

    const COOLDOWN: Duration = Duration::from_millis(1000);

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spaces_back_to_back_calls() {
        let limiter = RateLimiter::new();
        let interval = Duration::from_millis(2000);

        limiter.wait(interval).await;
        let first = Instant::now();
        limiter.wait(interval).await;
        let second = Instant::now();

        assert!(second - first >= interval);
        assert_eq!(limiter.last_call().await, Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_first_call_is_immediate() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.last_call().await, None);

        let start = Instant::now();
        limiter.wait(Duration::from_secs(5)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_only_waits_for_the_remainder() {
        let limiter = RateLimiter::new();
        let interval = Duration::from_millis(2000);

        limiter.wait(interval).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let start = Instant::now();
        limiter.wait(interval).await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_secs(10)).await;
        let start = Instant::now();
        limiter.wait(interval).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_serializes_concurrent_callers() {
        let limiter = Arc::new(RateLimiter::new());
        let interval = Duration::from_millis(1000);
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait(interval).await;
                    Instant::now()
                })
            })
            .collect();

        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }
        finished.sort();

        assert_eq!(finished[0] - start, Duration::ZERO);
        assert!(finished[1] - finished[0] >= interval);
        assert!(finished[2] - finished[1] >= interval);
    }

    #[test]
    fn test_next_step_table() {
        let rate_limited = AttemptFailure::Transient(TransientCause::RateLimited);
        let server = AttemptFailure::Transient(TransientCause::Server(502));
        let transport = AttemptFailure::Transient(TransientCause::Transport("refused".to_string()));
        let malformed = AttemptFailure::Malformed("expected value".to_string());

        for attempt in 1..=3 {
            assert_eq!(
                rate_limited.next_step(attempt, 3, COOLDOWN),
                NextStep::NextModel { advance_cursor: true, cooldown: Some(COOLDOWN) }
            );
            assert_eq!(
                AttemptFailure::Permanent.next_step(attempt, 3, COOLDOWN),
                NextStep::NextModel { advance_cursor: true, cooldown: None }
            );
        }

        assert_eq!(server.next_step(1, 3, COOLDOWN), NextStep::RetryAfterBackoff);
        assert_eq!(transport.next_step(2, 3, COOLDOWN), NextStep::RetryAfterBackoff);
        assert_eq!(malformed.next_step(2, 3, COOLDOWN), NextStep::RetryNow);

        let give_up = NextStep::NextModel { advance_cursor: false, cooldown: None };
        assert_eq!(server.next_step(3, 3, COOLDOWN), give_up);
        assert_eq!(transport.next_step(3, 3, COOLDOWN), give_up);
        assert_eq!(malformed.next_step(3, 3, COOLDOWN), give_up);
        assert_eq!(malformed.next_step(1, 1, COOLDOWN), give_up);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(AttemptOutcome::Success("{}".into()).into_text(), Ok("{}".to_string()));
        assert_eq!(AttemptOutcome::NotFound.into_text(), Err(AttemptFailure::Permanent));
        assert_eq!(
            AttemptOutcome::ServerError(0).into_text().map_err(|f| f.to_string()),
            Err("malformed success response".to_string())
        );
        assert_eq!(
            AttemptOutcome::RateLimited.into_text(),
            Err(AttemptFailure::Transient(TransientCause::RateLimited))
        );
        assert_eq!(AttemptFailure::Permanent.label(), "not_found");
    }

    #[test]
    fn test_retry_config_jitter_stays_in_range() {
        let config = RetryConfig {
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(8000),
            randomization_factor: 0.2,
            ..RetryConfig::default()
        };

        let mut backoff = config.backoff();
        let first = backoff.next_delay();
        assert!(first >= Duration::from_millis(800) && first <= Duration::from_millis(1200));

        for _ in 0..10 {
            assert!(backoff.next_delay() <= Duration::from_millis(9600));
        }
    }
}
