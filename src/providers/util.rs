use crate::core::config::RetryConfig;
use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with exponential backoff
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `policy`: `retries` extra attempts (total runs = 1 initial + retries); the
///   first retry waits `delay_ms`, each following one waits twice as long
///
/// # Returns
/// Either the successful result or the error of the final attempt
pub async fn with_retry<F, Fut, T, E>(mut operation: F, policy: RetryConfig) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    let mut attempt = 1;
    let mut delay = Duration::from_millis(policy.delay_ms);
    loop {
        match operation().await.map_err(Into::into) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > policy.retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, policy.retries, err, delay
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retry_until_success() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryConfig {
            retries: 3,
            delay_ms: 1,
        };

        let result = with_retry(
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 { Err(anyhow!("transient")) } else { Ok(n) }
            },
            policy,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_limit() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryConfig {
            retries: 2,
            delay_ms: 1,
        };

        let result: Result<(), Error> = with_retry(
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(anyhow!("down"))
            },
            policy,
        )
        .await;

        assert_eq!(result.unwrap_err().to_string(), "down");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
