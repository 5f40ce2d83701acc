//! Explicit retry policy, extracted from the claim sender's retry loop so it
//! stays testable against a paused tokio clock instead of a real sleep.

use std::time::Duration;

/// Exponential-backoff retry policy: `baseDelay * factor^attempt` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the attempt numbered `attempt` (0-indexed: the
    /// delay before the *second* attempt is `delay_before_attempt(0)`).
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * self.factor.pow(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_before_attempt(1), Duration::from_secs(2));
    }

    #[test]
    fn test_total_wait_for_three_attempts() {
        let policy = RetryPolicy::default();
        let total: Duration = (0..policy.max_attempts - 1)
            .map(|attempt| policy.delay_before_attempt(attempt))
            .sum();
        assert_eq!(total, Duration::from_secs(3));
    }
}
