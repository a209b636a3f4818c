//! Global dispatch-side rate limiter
//!
//! Successive `acquire` calls return at least `1/N` seconds apart no matter
//! how many tasks call it. Only dispatch is spaced; how long responses take
//! is not accounted for, so in-flight concurrency can still exceed N under
//! high latency.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Widest spacing the limiter will apply
const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct RateLimiter {
    interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter that admits at most `requests_per_second` dispatches
    /// per second
    ///
    /// Rates below one dispatch per day are clamped to one per day.
    pub fn per_second(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second)
                .unwrap_or(MAX_INTERVAL)
                .min(MAX_INTERVAL)
        } else {
            Duration::ZERO
        };
        Self::with_interval(interval)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next dispatch slot and claims it
    ///
    /// The lock is held through the wait so two callers can never claim
    /// slots closer together than the interval.
    ///
    /// # Returns
    ///
    /// The instant the slot was claimed
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }

        let now = Instant::now();
        *last = Some(now);
        now
    }
}
