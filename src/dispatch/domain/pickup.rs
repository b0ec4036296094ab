//! Persisted carrier pickup retry state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Retry bookkeeping stored on carrier tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PickupState {
    attempts: u32,
    next_attempt_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl PickupState {
    /// Returns a state due for its first attempt at `now`.
    #[must_use]
    pub const fn due_at(now: DateTime<Utc>) -> Self {
        Self {
            attempts: 0,
            next_attempt_at: Some(now),
            last_error: None,
        }
    }

    /// Returns the number of failed attempts so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns when the next attempt is due, or `None` when no attempt is
    /// outstanding.
    #[must_use]
    pub const fn next_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.next_attempt_at
    }

    /// Returns the last carrier error message.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns whether an attempt is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_attempt_at.is_some_and(|due| due <= now)
    }

    pub(crate) fn record_failure(&mut self, error: String, next_attempt_at: Option<DateTime<Utc>>) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error);
        self.next_attempt_at = next_attempt_at;
    }

    pub(crate) fn hold_until(&mut self, until: DateTime<Utc>) {
        self.next_attempt_at = Some(until);
    }

    pub(crate) fn settle(&mut self) {
        self.next_attempt_at = None;
    }
}

/// Bounded exponential backoff for carrier pickup attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupRetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl PickupRetryPolicy {
    /// Creates a policy. `max_attempts` counts every attempt, the first
    /// included.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Returns the attempt limit.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay after the `failures`-th consecutive failure:
    /// `base * 2^(failures - 1)`, capped at the maximum delay.
    #[must_use]
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(30);
        let factor = 1_i32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Returns when to retry after `failures` failures, or `None` once the
    /// attempt limit is reached.
    #[must_use]
    pub fn next_attempt(&self, failures: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (failures < self.max_attempts).then(|| now + self.delay_after(failures))
    }
}

impl Default for PickupRetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::seconds(30), Duration::minutes(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 30)]
    #[case(2, 60)]
    #[case(3, 120)]
    #[case(6, 600)]
    fn delay_doubles_until_capped(#[case] failures: u32, #[case] expected_seconds: i64) {
        let policy = PickupRetryPolicy::new(10, Duration::seconds(30), Duration::minutes(10));
        assert_eq!(
            policy.delay_after(failures),
            Duration::seconds(expected_seconds)
        );
    }

    #[test]
    fn stops_at_the_attempt_limit() {
        let policy = PickupRetryPolicy::new(3, Duration::seconds(30), Duration::minutes(10));
        let now = DateTime::<Utc>::UNIX_EPOCH;
        assert!(policy.next_attempt(2, now).is_some());
        assert_eq!(policy.next_attempt(3, now), None);
    }

    #[test]
    fn failure_records_attempt_and_error() {
        let now = DateTime::<Utc>::UNIX_EPOCH;
        let mut state = PickupState::due_at(now);
        assert!(state.is_due(now));

        state.record_failure("carrier timeout".to_owned(), Some(now + Duration::seconds(30)));

        assert_eq!(state.attempts(), 1);
        assert_eq!(state.last_error(), Some("carrier timeout"));
        assert!(!state.is_due(now));
    }

    #[test]
    fn hold_defers_the_attempt_without_counting_it() {
        let now = DateTime::<Utc>::UNIX_EPOCH;
        let mut state = PickupState::due_at(now);

        state.hold_until(now + Duration::minutes(5));

        assert_eq!(state.attempts(), 0);
        assert!(!state.is_due(now + Duration::minutes(4)));
        assert!(state.is_due(now + Duration::minutes(5)));
    }
}
