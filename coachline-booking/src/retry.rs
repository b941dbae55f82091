//! Backoff schedule for seat commits.
//!
//! A stale commit is retried after a short, growing, jittered delay. Once `max_attempts` is spent the engines give up with
//! `BookingError::Conflict` instead of blocking.

use std::time::Duration;

use rand::Rng;

/// Retry policy configuration for exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap for the exponential growth.
    pub max_delay: Duration,
    /// Multiplier applied after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Upper bound of the delay after the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(30) as i32;
        let delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exp);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }

    /// Full-jitter delay: uniform in `[0, delay_for_attempt]`, so racing
    /// callers spread out instead of colliding again.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let cap = self.delay_for_attempt(attempt);
        if cap.is_zero() {
            return cap;
        }
        let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        cap.mul_f64(factor)
    }

    pub async fn backoff(&self, attempt: u32) {
        tokio::time::sleep(self.jittered_delay(attempt)).await;
    }
}
