//! Bounded exponential backoff around a single provider call.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use geopulse_common::{AuditConfig, ProviderError};

/// Retry schedule for one logical provider call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries on top of the first attempt.
    pub max_retries: u32,
    /// Base backoff duration; actual delay is base * 2^attempt + jitter.
    pub backoff_base: Duration,
    /// Deadline per attempt. An attempt exceeding it counts as a retryable
    /// timeout.
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration, call_timeout: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
            call_timeout,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.max_retries, config.backoff_base, config.call_timeout)
    }
}

/// Run `op` under the policy: per-attempt timeout, exponential backoff with
/// jitter (0-250ms), retrying only failures the adapter marked retryable.
pub async fn call_with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        let result = match tokio::time::timeout(policy.call_timeout, op()).await {
            Ok(r) => r,
            Err(_) => Err(ProviderError::timeout(format!(
                "{what} exceeded {}ms deadline",
                policy.call_timeout.as_millis()
            ))),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.retryable && attempt < policy.max_retries => {
                let backoff = policy.backoff_base * 2u32.pow(attempt);
                let jitter = Duration::from_millis(rand::rng().random_range(0..250));
                warn!(
                    what,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Provider call failed, retrying after backoff"
                );
                tokio::time::sleep(backoff + jitter).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use geopulse_common::ProviderErrorKind;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_retryable_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(fast_policy(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::new(ProviderErrorKind::Api, "flaky", true))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::new(
                    ProviderErrorKind::Api,
                    "bad request",
                    false,
                ))
            }
        })
        .await;
        assert!(!result.unwrap_err().retryable);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::new(
                    ProviderErrorKind::RateLimited,
                    "always limited",
                    true,
                ))
            }
        })
        .await;
        assert!(result.is_err());
        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_is_retryable() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1), Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(policy, "slow", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
