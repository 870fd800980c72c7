use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for workload updates rejected with a version conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay, in milliseconds, before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound of the delay between two attempts.
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f32,
}

impl RetryConfig {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = self.initial_delay_ms as f64 * f64::from(self.backoff_factor).powi(exponent);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64).max(0.0);

        Duration::from_millis(delay_ms as u64)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 1_000,
            backoff_factor: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_up_to_the_cap() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_factor: 2.0,
        };

        assert_eq!(config.delay_after(1), Duration::from_millis(100));
        assert_eq!(config.delay_after(2), Duration::from_millis(200));
        assert_eq!(config.delay_after(4), Duration::from_millis(800));
        assert_eq!(config.delay_after(5), Duration::from_millis(1_000));
        assert_eq!(config.delay_after(30), Duration::from_millis(1_000));
    }

    #[test]
    fn factor_of_one_gives_a_fixed_delay() {
        let config = RetryConfig {
            backoff_factor: 1.0,
            ..RetryConfig::default()
        };

        assert_eq!(config.delay_after(1), config.delay_after(4));
    }
}
