//! The fixed retry policy applied to every call.
//!
//! Every soft failure is retried the same way: a constant wait, then another
//! attempt, until the attempt bound is reached.

use std::time::Duration;

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Default wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How many attempts to make and how long to wait between them.
///
/// # Examples
///
/// ```
/// use edgecall::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::fixed(3, Duration::from_millis(250));
///
/// assert_eq!(policy.delay_after(1), Some(Duration::from_millis(250)));
/// assert_eq!(policy.delay_after(2), Some(Duration::from_millis(250)));
/// // No wait after the last attempt.
/// assert_eq!(policy.delay_after(3), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with a fixed delay.
    ///
    /// A `max_attempts` of zero is treated as one.
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// The maximum number of attempts per call.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The wait between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the wait before the attempt following `attempt` (1-indexed),
    /// or `None` if `attempt` was the last one allowed.
    pub fn delay_after(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_attempts {
            None
        } else {
            Some(self.delay)
        }
    }

    pub(crate) fn with_max_attempts(self, max_attempts: usize) -> Self {
        Self::fixed(max_attempts, self.delay)
    }

    pub(crate) fn with_delay(self, delay: Duration) -> Self {
        Self::fixed(self.max_attempts, delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 10);
        assert_eq!(policy.delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_fixed_delays() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));

        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(3), None);
        assert_eq!(policy.delay_after(4), None);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::fixed(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_after(1), None);
    }

    #[test]
    fn test_partial_overrides() {
        let policy = RetryPolicy::default()
            .with_max_attempts(2)
            .with_delay(Duration::from_millis(5));

        assert_eq!(policy, RetryPolicy::fixed(2, Duration::from_millis(5)));
    }
}
