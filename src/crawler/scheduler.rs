//! Politeness scheduling between fetches
//!
//! The crawl waits `base_delay × uniform(0.5, 1.5)` after every fetched URL so
//! requests do not arrive at a fixed rhythm. The wait is a cancellation point.

use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Lower bound of the jitter factor
const JITTER_MIN: f64 = 0.5;

/// Upper bound (exclusive) of the jitter factor
const JITTER_MAX: f64 = 1.5;

/// Randomized delay between consecutive fetches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Politeness {
    base_delay: Duration,
}

impl Politeness {
    /// Creates a scheduler from a base delay in seconds
    ///
    /// Negative or non-finite values are treated as zero.
    pub fn from_secs(base_delay_secs: f64) -> Self {
        Self {
            base_delay: Duration::try_from_secs_f64(base_delay_secs).unwrap_or(Duration::ZERO),
        }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Draws the next delay
    pub fn next_delay(&self) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = rand::rng().random_range(JITTER_MIN..JITTER_MAX);
        self.base_delay.mul_f64(factor)
    }

    /// Sleeps for the next delay unless cancelled first
    ///
    /// # Returns
    ///
    /// `false` if the token was cancelled before or during the wait
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
