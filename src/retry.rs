//! Retry logic with backoff
//!
//! This module provides configurable retry logic for transient filesystem
//! failures. The default policy is a fixed backoff (multiplier 1.0) with no
//! jitter; a multiplier above 1.0 turns it into exponential backoff.
//!
//! # Example
//!
//! ```no_run
//! use mobile_pkg_renamer::retry::{IsRetryable, with_retry};
//! use mobile_pkg_renamer::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Busy,
//!     Gone,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Busy)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! with_retry(&config, || async { Ok::<_, MyError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (file locked by another process, interrupted syscall)
/// should return `true`. Permanent failures (missing source, invalid name)
/// should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

/// I/O error kinds treated as transient when renaming
pub fn is_transient_io_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::PermissionDenied
            | ErrorKind::ResourceBusy
            | ErrorKind::Interrupted
            | ErrorKind::TimedOut
            | ErrorKind::WouldBlock
    )
}

impl IsRetryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        is_transient_io_kind(self.kind())
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Io(e) => e.is_retryable(),
            Error::Timeout { .. } => true,
            Error::ExternalTool(msg) => msg.contains("busy") || msg.contains("temporary"),
            Error::Config { .. } => false,
            Error::Archive(_) => false,
            Error::Parse { .. } => false,
            Error::Rename(_) => false,
            Error::NotSupported(_) => false,
            Error::Serialization(_) => false,
            Error::Other(_) => false,
        }
    }
}

/// Execute an async operation, retrying transient failures
///
/// The operation runs at most `config.max_attempts + 1` times. Non-retryable
/// errors are returned immediately.
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays, backoff multiplier, jitter)
/// * `operation` - Async closure that returns `Result<T, E>` where `E` implements [`IsRetryable`]
///
/// # Returns
///
/// The successful result, or the last error after all retry attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut retry = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if retry > 0 {
                    tracing::debug!(retries = retry, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::debug!(error = %err, "permanent failure, not retrying");
            return Err(err);
        }
        if retry >= config.max_attempts {
            tracing::warn!(error = %err, attempts = retry + 1, "giving up after retries");
            return Err(err);
        }

        let wait = if config.jitter { add_jitter(delay) } else { delay };
        tracing::warn!(
            error = %err,
            retry = retry + 1,
            max_attempts = config.max_attempts,
            wait_ms = wait.as_millis(),
            "transient failure, retrying"
        );
        tokio::time::sleep(wait).await;
        delay = next_delay(delay, config);
        retry += 1;
    }
}

fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    delay
        .mul_f64(config.backoff_multiplier)
        .min(config.max_delay)
}

/// Add random jitter to a delay
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    delay.mul_f64(factor)
}
