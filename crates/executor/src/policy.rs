use crate::error::FailureCode;
use rand::Rng;
use std::time::Duration;

/// What the executor should do about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Refresh credentials, then back off and retry.
    Reauth,
    /// Back off and retry.
    Backoff,
    /// Stop the whole run.
    Fatal,
}

/// Exponential backoff with a ceiling and uniform jitter.
///
/// The delay before retry number `attempt` (1-based) is
/// `min(base * 2^attempt, max_wait)` plus a random amount in `[0, jitter)`.
/// Once an action has been retried `max_attempts` times, [`delay`](Self::delay)
/// returns `None` and the failure becomes fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    max_wait: Duration,
    max_attempts: u32,
    jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
            max_attempts: 10,
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// A zero jitter makes delays fully deterministic.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn classify(&self, code: FailureCode) -> Classification {
        match code {
            FailureCode::Unauthorized => Classification::Reauth,
            FailureCode::RateLimited | FailureCode::Unknown => Classification::Backoff,
            FailureCode::BadRequest => Classification::Fatal,
        }
    }

    /// Deterministic part of the delay, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_wait)
    }

    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.max_attempts {
            return None;
        }
        Some(self.backoff(attempt) + self.jitter())
    }

    fn jitter(&self) -> Duration {
        let ceiling = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..ceiling))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureCode::Unauthorized, Classification::Reauth)]
    #[case(FailureCode::RateLimited, Classification::Backoff)]
    #[case(FailureCode::Unknown, Classification::Backoff)]
    #[case(FailureCode::BadRequest, Classification::Fatal)]
    fn test_classification(#[case] code: FailureCode, #[case] expected: Classification) {
        assert_eq!(RetryPolicy::default().classify(code), expected);
    }

    #[rstest]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    #[case(4, 16)]
    #[case(5, 30)]
    #[case(9, 30)]
    #[case(40, 30)]
    fn test_backoff_doubles_until_capped(#[case] attempt: u32, #[case] secs: u64) {
        assert_eq!(RetryPolicy::default().backoff(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn test_delay_adds_bounded_jitter() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay(2).unwrap();
            assert!(delay >= Duration::from_secs(4));
            assert!(delay < Duration::from_secs(5));
        }
    }

    #[test]
    fn test_delay_stops_past_the_ceiling() {
        let policy = RetryPolicy::default().with_max_attempts(3).with_jitter(Duration::ZERO);
        assert_eq!(policy.delay(3), Some(Duration::from_secs(8)));
        assert_eq!(policy.delay(4), None);
    }
}
