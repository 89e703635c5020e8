use std::time::Duration;

use crate::domain::error::MarketError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded retry for operations that lost a storage-level write race
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Whether attempt number `attempt` (1-based) may be followed by another
    pub fn should_retry(&self, attempt: u32, err: &MarketError) -> bool {
        matches!(err, MarketError::Conflict(_)) && attempt < self.max_attempts
    }

    /// Linear backoff before the next attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_retried() {
        let policy = RetryPolicy::new(3);
        assert!(policy.should_retry(1, &MarketError::Conflict("stale".to_string())));
        assert!(!policy.should_retry(1, &MarketError::SelfPurchase));
    }

    #[test]
    fn attempts_are_bounded() {
        let policy = RetryPolicy::new(3);
        let conflict = MarketError::Conflict("stale".to_string());
        assert!(policy.should_retry(2, &conflict));
        assert!(!policy.should_retry(3, &conflict));
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
