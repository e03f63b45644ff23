//! Retry budget decision and backoff helper.

use std::time::Duration;

/// What a failed attempt leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Budget left: the job goes to Retrying.
    Retry,

    /// Budget exhausted: the job goes to Failed.
    GiveUp,
}

/// Decide after a failed attempt.
///
/// `retries` is the number of re-attempts allowed after the first one, so
/// `retries = 0` makes the first failure final and `retries = N` permits N
/// more attempts.
pub fn decide(retries: u32, attempts: u32) -> RetryDecision {
    if retries >= attempts {
        RetryDecision::Retry
    } else {
        RetryDecision::GiveUp
    }
}

/// Exponential backoff for strategies that delay re-attempts.
///
/// The job itself never waits; this only computes how long a queue strategy
/// might hold a Retrying job before calling `start()` again.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Delay before the first re-attempt.
    pub base_delay: Duration,

    pub multiplier: f64,

    /// Upper bound on any single delay.
    pub max_delay: Option<Duration>,
}

impl Backoff {
    pub fn new(base_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay: None,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Delay after `attempts` attempts (1-indexed): `base_delay * multiplier^(attempts - 1)`.
    ///
    /// With base=2s, multiplier=2.0: 2s, 4s, 8s, ...
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_retries_first_failure(0, 1, RetryDecision::GiveUp)]
    #[case::two_retries_first_failure(2, 1, RetryDecision::Retry)]
    #[case::two_retries_second_failure(2, 2, RetryDecision::Retry)]
    #[case::two_retries_third_failure(2, 3, RetryDecision::GiveUp)]
    #[case::failed_before_any_start(0, 0, RetryDecision::Retry)]
    fn decide_compares_budget_with_attempts(
        #[case] retries: u32,
        #[case] attempts: u32,
        #[case] expected: RetryDecision,
    ) {
        assert_eq!(decide(retries, attempts), expected);
    }

    #[test]
    fn exponential_backoff_increases() {
        let backoff = Backoff::default();

        assert_eq!(backoff.next_delay(0), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(1), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(2), Duration::from_secs(4));
        assert_eq!(backoff.next_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn max_delay_caps_growth() {
        let backoff = Backoff::new(Duration::from_millis(100), 10.0)
            .with_max_delay(Duration::from_secs(1));

        assert_eq!(backoff.next_delay(2), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(500), Duration::from_secs(1));
    }
}
