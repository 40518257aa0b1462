use common::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

/// Bounded retry with exponential backoff: after failed attempt `n` the
/// caller waits `backoff_base ^ n` seconds.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.backoff_base.powi(attempt as i32);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 1.5)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base)
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: common::Error,
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is spent.
///
/// The closure receives the 1-based attempt number. Each sleep blocks the
/// caller for the full backoff; there is no cancellation in between.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = common::Result<T>>,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "Attempt failed, backing off");
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;
    use std::cell::Cell;

    #[test]
    fn delay_grows_as_power_of_base() {
        let policy = RetryPolicy::new(5, 1.5);
        assert_eq!(policy.delay_for(1), Duration::from_secs_f64(1.5));
        assert_eq!(policy.delay_for(2), Duration::from_secs_f64(2.25));
        assert_eq!(policy.delay_for(3), Duration::from_secs_f64(3.375));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(5, 1.5);

        let result = retry_with_backoff(&policy, |_| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(Error::GatewayTimeout)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let policy = RetryPolicy::new(4, 2.0);

        let result: Result<(), _> = retry_with_backoff(&policy, |attempt| {
            calls.set(attempt);
            async { Err(Error::RateLimit) }
        })
        .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(calls.get(), 4);
        assert!(matches!(exhausted.last_error, Error::RateLimit));
    }
}
