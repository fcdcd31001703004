//! Retry with exponential backoff for listing requests

use crate::constants::MAX_BACKOFF_MS;
use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many extra attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// Runs `op`, retrying transient failures with doubling backoff
///
/// Non-transient errors (such as an unparsable body) are returned at once.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut backoff = policy.initial_backoff;
    let max_attempts = policy.max_retries + 1;
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && e.is_transient() => {
                tracing::warn!(
                    request = what,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retries_once_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = Instant::now();

        let result = retry_with_backoff(
            RetryPolicy::new(1, Duration::from_millis(500)),
            "markets",
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ProviderError::Timeout)
                } else {
                    Ok(7)
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_with_backoff(
            RetryPolicy::new(2, Duration::from_millis(100)),
            "markets",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::RateLimitExceeded)
            },
        )
        .await;

        assert!(matches!(result, Err(ProviderError::RateLimitExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_response_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_with_backoff(
            RetryPolicy::new(3, Duration::from_millis(1)),
            "markets",
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::invalid_response("garbage"))
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<(), _> = retry_with_backoff(RetryPolicy::none(), "markets", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Timeout)
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
