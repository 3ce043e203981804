//! Retry policy with exponential backoff
//!
//! Generic over the operation and its error type so every upstream call site
//! shares one loop: attempt, classify, back off, give up.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::models::Cancelled;
use crate::config::GenerationConfig;

/// Bounded retry with `base_delay * 2^attempt_index` backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_secs(60),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
        }
    }

    /// Delay before the retry that follows failed attempt `attempt_index` (0-based)
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

        if self.jitter && !delay.is_zero() {
            // +/-10%
            let jitter_factor = 1.0 + 0.2 * (rand::random::<f64>() - 0.5);
            Duration::from_secs_f64(delay.as_secs_f64() * jitter_factor)
        } else {
            delay
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut, C>(
        &self,
        cancel: &CancellationToken,
        is_retryable: C,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: std::fmt::Display + From<Cancelled>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled.into());
            }
            attempt += 1;

            match op(attempt).await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::debug!("Retry succeeded on attempt {}", attempt);
                    }
                    return Ok(result);
                },
                Err(error) => {
                    if !is_retryable(&error) {
                        tracing::warn!("Attempt {} failed with non-retryable error: {}", attempt, error);
                        return Err(error);
                    }
                    if attempt >= max_attempts {
                        tracing::error!("Retry failed after {} attempts: {}", attempt, error);
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        error,
                        delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(Cancelled.into()),
                        _ = tokio::time::sleep(delay) => {},
                    }
                },
            }
        }
    }
}
