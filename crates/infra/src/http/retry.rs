//! Retry policy for the request executor.

use std::time::Duration;

use tasklink_domain::{RetrySettings, TaskLinkError, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS};

use crate::errors::{failure_class, FailureClass};

/// Immutable retry policy handed to the executor at construction.
///
/// The first retry happens immediately; later retries wait `retry_delay`.
/// Only network-transient failures qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    /// Three retries, 500 ms between the later ones.
    pub const DEFAULT: Self = Self::new(DEFAULT_RETRIES, Duration::from_millis(DEFAULT_RETRY_DELAY_MS));

    /// Policy with `retries` retries waiting `retry_delay` from the second on.
    pub const fn new(retries: u32, retry_delay: Duration) -> Self {
        Self { retries, retry_delay }
    }

    /// Same retry count with no waiting; intended for tests.
    pub const fn immediate(retries: u32) -> Self {
        Self::new(retries, Duration::ZERO)
    }

    /// Automatic retries after the first attempt.
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Initial attempt plus retries.
    pub const fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Only network-transient failures are retried.
    pub fn is_retryable(&self, err: &TaskLinkError) -> bool {
        failure_class(err) == FailureClass::NetworkTransient
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry <= 1 {
            Duration::ZERO
        } else {
            self.retry_delay
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(settings.retries, Duration::from_millis(settings.retry_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use tasklink_domain::ErrorKind;

    use super::*;

    #[test]
    fn default_policy_shape() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries(), 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
    }

    #[test]
    fn retries_network_failures_only() {
        let policy = RetryPolicy::immediate(3);
        assert!(policy.is_retryable(&TaskLinkError::network("reset")));
        assert!(!policy.is_retryable(&TaskLinkError::new(ErrorKind::Http, "503").with_status(503)));
        assert!(!policy.is_retryable(&TaskLinkError::new(ErrorKind::Timeout, "slow")));
    }

    #[test]
    fn builds_from_settings() {
        let policy = RetryPolicy::from(RetrySettings { retries: 1, retry_delay_ms: 20 });
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
    }
}
