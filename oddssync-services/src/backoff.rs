//! Reconnect backoff schedule

use std::time::Duration;

/// First reconnect delay
pub const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);

/// Longest reconnect delay
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(10);

/// Exponential backoff capped at `max`. Retries are unbounded; the attempt
/// counter is reset by the caller after a successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: RECONNECT_DELAY_BASE,
            max: RECONNECT_DELAY_MAX,
        }
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before retry number `attempt` (0-based): `min(base * 2^attempt, max)`
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let backoff = Backoff::default();
        let delays: Vec<u64> = (0..6).map(|n| backoff.delay(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn test_large_attempts_saturate() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(40), RECONNECT_DELAY_MAX);
        assert_eq!(backoff.delay(u32::MAX), RECONNECT_DELAY_MAX);
    }

    #[test]
    fn test_custom_schedule() {
        let backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(1));
        assert_eq!(backoff.delay(0), Duration::from_millis(250));
        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(3), Duration::from_secs(1));
    }
}
