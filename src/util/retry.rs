//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::FarmGuideError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation, retrying errors that report
    /// [`FarmGuideError::is_retryable`].
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, FarmGuideError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FarmGuideError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };
            if !error.is_retryable() || attempt >= attempts {
                return Err(error);
            }

            let wait = match &error {
                FarmGuideError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms).min(self.max_backoff),
                _ => backoff.mul_f64(jitter_factor()),
            };
            tracing::warn!(
                attempt,
                max_attempts = attempts,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "retrying after error"
            );
            tokio::time::sleep(wait).await;

            backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
        }
    }
}

/// Jitter in [0.75, 1.25), drawn from the random bits of a v4 UUID.
fn jitter_factor() -> f64 {
    let bits = uuid::Uuid::new_v4().as_u128() as u16;
    0.75 + (bits as f64 / u16::MAX as f64) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy(3)
            .execute(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(FarmGuideError::api(502, "bad gateway"))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_on_non_retryable_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast_policy(5)
            .execute(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FarmGuideError::InvalidArgument("bad".into()))
            })
            .await;

        assert!(matches!(result, Err(FarmGuideError::InvalidArgument(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jitter_stays_in_range() {
        for _ in 0..100 {
            let f = jitter_factor();
            assert!((0.75..=1.25).contains(&f));
        }
    }
}
