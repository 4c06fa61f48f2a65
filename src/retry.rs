//! Retry with exponential backoff for transient NNTP failures
//!
//! Opening a group session is the only step that is retried: a busy server or
//! a dropped connection while selecting a group is worth another attempt, a
//! missing group is not.
//!
//! # Example
//!
//! ```no_run
//! use nzb_direct_search::retry::{IsRetryable, with_retry};
//! use nzb_direct_search::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum SelectError {
//!     Busy,
//!     Missing,
//! }
//!
//! impl std::fmt::Display for SelectError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for SelectError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, SelectError::Busy)
//!     }
//! }
//!
//! # async fn example() -> Result<(), SelectError> {
//! let config = RetryConfig::default();
//! with_retry(&config, || async { Ok::<_, SelectError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient (worth retrying) or permanent
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Nntp(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("busy")
                    || msg.contains("connection")
                    || msg.contains("temporar")
                    || msg.contains("400")
                    || msg.contains("503")
            }
            // Missing group, bad request, boundary and scan failures are final
            Error::Group { .. }
            | Error::Config { .. }
            | Error::Boundary { .. }
            | Error::Scan { .. }
            | Error::NoResultsFound => false,
        }
    }
}

/// Run an async operation, retrying transient failures with exponential backoff
///
/// Returns the first success, or the last error once `max_attempts` retries
/// are used up or a non-retryable error occurs.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                let wait = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };
                tokio::time::sleep(wait).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::warn!(error = %e, attempts = attempt + 1, "retry attempts exhausted");
                }
                return Err(e);
            }
        }
    }
}

/// Stretch a delay by a uniform factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn busy_server_is_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_config(3), || {
            let calls = calls_clone.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Nntp("400 server busy".into()))
                } else {
                    Ok("alt.binaries.test")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "alt.binaries.test");
        assert_eq!(calls.load(Ordering::SeqCst), 3, "two retries before success");
    }

    #[tokio::test]
    async fn missing_group_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_config(3), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Group {
                    group: "alt.gone".into(),
                    message: "no such newsgroup".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Group { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "permanent error must not be retried");
    }

    #[tokio::test]
    async fn retries_stop_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_config(2), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Nntp("connection reset by peer".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial attempt plus two retries");
    }

    #[tokio::test]
    async fn no_retry_config_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let _ = with_retry(&RetryConfig::no_retry(), || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Nntp("timeout".into()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn classification_of_search_errors() {
        assert!(Error::Nntp("Connection closed".into()).is_retryable());
        assert!(Error::Nntp("503 service temporarily unavailable".into()).is_retryable());
        assert!(!Error::Nntp("481 authentication rejected".into()).is_retryable());
        assert!(!Error::NoResultsFound.is_retryable());
        assert!(!Error::config("No groups provided", "groups").is_retryable());
    }

    #[test]
    fn jitter_stays_within_double_delay() {
        let base = Duration::from_millis(100);
        for _ in 0..100 {
            let jittered = add_jitter(base);
            assert!(jittered >= base && jittered <= base * 2, "got {jittered:?}");
        }
    }
}
