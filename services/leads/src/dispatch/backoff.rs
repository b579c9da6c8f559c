use std::time::Duration;

use rand::RngExt;

/// Bounded exponential backoff for staff notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-indexed): `base * 2^(attempt-1)`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        2u32.checked_pow(attempt - 1)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Add up to 10% random jitter so retries from concurrent jobs spread out.
pub fn with_jitter(delay: Duration) -> Duration {
    let max_extra = u64::try_from(delay.as_millis() / 10).unwrap_or(u64::MAX);
    if max_extra == 0 {
        return delay;
    }
    let extra = rand::rng().random_range(0..=max_extra);
    delay.saturating_add(Duration::from_millis(extra))
}
