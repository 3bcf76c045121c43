//! Bounded retry schedule shared by every retrieval path.

use std::time::Duration;

/// How the delay grows between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    /// Every retry waits `base_delay`.
    Fixed,
    /// Retry `n` waits `n * base_delay`.
    Linear,
    /// Retry `n` waits `base_delay * 2^(n-1)`.
    Exponential,
}

/// Retry budget for a single retrieval call.
///
/// Attempts are numbered from 0. Attempt 0 dispatches immediately; attempt
/// `n > 0` first waits [`delay_before(n)`](Self::delay_before).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries once and never waits.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        }
    }

    /// Number of attempts, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to sleep before dispatching `attempt`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = match self.backoff {
            Backoff::Fixed => 1,
            Backoff::Linear => attempt,
            Backoff::Exponential => 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX),
        };
        self.base_delay.saturating_mul(factor)
    }

    /// Worst-case time spent sleeping across the whole budget.
    pub fn total_delay(&self) -> Duration {
        (0..self.attempts())
            .map(|attempt| self.delay_before(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(backoff: Backoff) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            backoff,
        }
    }

    #[test]
    fn test_first_attempt_never_waits() {
        for backoff in [Backoff::Fixed, Backoff::Linear, Backoff::Exponential] {
            assert_eq!(policy(backoff).delay_before(0), Duration::ZERO);
        }
    }

    #[test]
    fn test_linear_backoff() {
        let policy = policy(Backoff::Linear);
        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before(3), Duration::from_millis(300));
        assert_eq!(policy.total_delay(), Duration::from_millis(600));
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = policy(Backoff::Exponential);
        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before(3), Duration::from_millis(400));
    }

    #[test]
    fn test_fixed_backoff() {
        let policy = policy(Backoff::Fixed);
        assert_eq!(policy.delay_before(3), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().total_delay(), Duration::ZERO);
    }

    #[test]
    fn test_huge_exponent_saturates() {
        let policy = RetryPolicy {
            max_attempts: 100,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential,
        };
        assert!(policy.delay_before(80) >= Duration::from_secs(u32::MAX as u64));
    }
}
