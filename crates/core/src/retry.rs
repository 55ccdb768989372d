//! Bounded fixed-delay retry.
//!
//! [`retry`] keeps invoking an operation until a confirmation predicate
//! accepts its result or the attempt budget runs out. The delay between
//! attempts is constant: no backoff, no jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default attempt budget.
pub const DEFAULT_MAX_RETRIES: u32 = 30;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5_000);

/// Tunable parameters for [`retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up.
    pub max_retries: u32,
    /// Pause between a rejected attempt and the next one.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Terminal failure of [`retry`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RetryError {
    #[error("Max retries reached after {attempts} attempts")]
    MaxRetriesReached { attempts: u32 },
}

/// Run `run` until `confirm` accepts its output.
///
/// An `Err` from `run` and an `Ok` value rejected by `confirm` are treated
/// the same way: wait `config.delay`, then try again. Once
/// `config.max_retries` attempts have been made the call fails with
/// [`RetryError::MaxRetriesReached`] without sleeping again.
pub async fn retry<T, E, F, Fut, C>(
    mut run: F,
    confirm: C,
    config: &RetryConfig,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    C: Fn(&T) -> bool,
{
    let mut attempt = 0u32;

    while attempt < config.max_retries {
        attempt += 1;

        match run().await {
            Ok(value) if confirm(&value) => return Ok(value),
            Ok(_) => {
                tracing::debug!(attempt, "Retry attempt not confirmed");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Retry attempt {attempt} failed");
            }
        }

        if attempt < config.max_retries {
            tokio::time::sleep(config.delay).await;
        }
    }

    Err(RetryError::MaxRetriesReached { attempts: attempt })
}
