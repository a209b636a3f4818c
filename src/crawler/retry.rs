//! Retry combinator with capped exponential backoff

use crate::config::FetcherConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up
///
/// # Arguments
///
/// * `policy` - Attempt cap and backoff schedule
/// * `label` - What is being attempted, for log lines
/// * `is_retryable` - Decides whether an error earns another attempt
/// * `op` - Produces a fresh future per attempt
///
/// # Returns
///
/// The first success, or the last error seen
pub async fn retry_with_backoff<T, E, Op, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: P,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_attempts && is_retryable(&err) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "{} failed: {}; retrying in {:.1}s (attempt {}/{})",
                    label,
                    err,
                    delay.as_secs_f64(),
                    attempt,
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
