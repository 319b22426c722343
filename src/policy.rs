//! Breaker configuration
//!
//! A [`Policy`] is immutable once a breaker is built and is validated
//! exactly once at construction. Rate comparisons use integer
//! arithmetic (`failed * 100 >= threshold * total`) so no floating
//! point artefacts creep into trip decisions.

use std::time::Duration;

use crate::errors::PolicyError;
use crate::window::{CountWindow, SlidingWindow, TimeWindow, Totals};

/// Shape of the sliding window feeding the rate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// Last N samples
    CountBased,
    /// Samples from the last N seconds
    TimeBased,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct Policy {
    /// Percentage (0-100) of failed calls at which the circuit trips
    pub failure_rate_threshold: u8,

    /// Percentage (0-100) of slow calls at which the circuit trips
    pub slow_call_rate_threshold: u8,

    /// Which window variant aggregates outcomes
    pub window_kind: WindowKind,

    /// Ring capacity in samples (count-based) or seconds (time-based)
    pub sliding_window_size: u32,

    /// Minimum recorded calls before rates are evaluated
    pub minimum_number_of_calls: u32,

    /// Probe budget per HalfOpen episode
    pub permitted_calls_in_half_open: u32,

    /// Calls lasting strictly longer than this are slow
    pub slow_call_duration_threshold: Duration,

    /// How long Open persists before probing begins
    pub wait_duration_in_open: Duration,

    /// HalfOpen episodes without a decision revert to Open after this;
    /// zero disables the timeout
    pub max_wait_duration_in_half_open: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50,
            slow_call_rate_threshold: 100,
            window_kind: WindowKind::CountBased,
            sliding_window_size: 100,
            minimum_number_of_calls: 100,
            permitted_calls_in_half_open: 10,
            slow_call_duration_threshold: Duration::from_secs(60),
            wait_duration_in_open: Duration::from_secs(60),
            max_wait_duration_in_half_open: Duration::ZERO,
        }
    }
}

impl Policy {
    /// Check the configuration for nonsensical values.
    ///
    /// Durations and call counts are unsigned, so only the percentage
    /// bounds and the two positive-size requirements can fail.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.failure_rate_threshold > 100 {
            return Err(PolicyError::RateOutOfRange {
                name: "failure_rate_threshold",
                value: self.failure_rate_threshold,
            });
        }
        if self.slow_call_rate_threshold > 100 {
            return Err(PolicyError::RateOutOfRange {
                name: "slow_call_rate_threshold",
                value: self.slow_call_rate_threshold,
            });
        }
        if self.sliding_window_size == 0 {
            return Err(PolicyError::ZeroWindowSize);
        }
        if self.permitted_calls_in_half_open == 0 {
            return Err(PolicyError::ZeroHalfOpenPermits);
        }
        Ok(())
    }

    /// Instantiate the window variant this policy asks for
    pub(crate) fn make_window(&self) -> Box<dyn SlidingWindow> {
        match self.window_kind {
            WindowKind::CountBased => Box::new(CountWindow::new(self.sliding_window_size)),
            WindowKind::TimeBased => Box::new(TimeWindow::new(self.sliding_window_size)),
        }
    }

    /// Whether a call of the given duration counts as slow
    pub(crate) fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.slow_call_duration_threshold
    }

    /// Whether either rate threshold is breached by these totals
    pub(crate) fn breaches(&self, totals: &Totals) -> bool {
        totals.total > 0
            && (totals.failed * 100 >= u64::from(self.failure_rate_threshold) * totals.total
                || totals.slow * 100 >= u64::from(self.slow_call_rate_threshold) * totals.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert!(Policy::default().validate().is_ok());
    }

    #[test]
    fn test_rate_above_hundred_rejected() {
        let policy = Policy {
            failure_rate_threshold: 101,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::RateOutOfRange {
                name: "failure_rate_threshold",
                value: 101,
            })
        ));

        let policy = Policy {
            slow_call_rate_threshold: 200,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::RateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_window_size_rejected() {
        let policy = Policy {
            sliding_window_size: 0,
            ..Default::default()
        };
        assert_eq!(policy.validate(), Err(PolicyError::ZeroWindowSize));
    }

    #[test]
    fn test_zero_half_open_permits_rejected() {
        let policy = Policy {
            permitted_calls_in_half_open: 0,
            ..Default::default()
        };
        assert_eq!(policy.validate(), Err(PolicyError::ZeroHalfOpenPermits));
    }

    #[test]
    fn test_breach_uses_integer_arithmetic() {
        let policy = Policy {
            failure_rate_threshold: 50,
            slow_call_rate_threshold: 60,
            ..Default::default()
        };

        // 10 of 20 failed: 1000 >= 1000, trips exactly at the boundary
        let at_boundary = Totals {
            total: 20,
            failed: 10,
            slow: 0,
        };
        assert!(policy.breaches(&at_boundary));

        // 10 of 21 failed: 1000 >= 1050 is false
        let below = Totals {
            total: 21,
            failed: 10,
            slow: 0,
        };
        assert!(!policy.breaches(&below));

        // 12 of 20 slow: 1200 >= 1200
        let slow = Totals {
            total: 20,
            failed: 0,
            slow: 12,
        };
        assert!(policy.breaches(&slow));
    }

    #[test]
    fn test_empty_totals_never_breach() {
        let policy = Policy {
            failure_rate_threshold: 0,
            slow_call_rate_threshold: 0,
            ..Default::default()
        };
        assert!(!policy.breaches(&Totals::default()));
    }

    #[test]
    fn test_slow_classification_is_strict() {
        let policy = Policy {
            slow_call_duration_threshold: Duration::from_millis(10),
            ..Default::default()
        };

        assert!(!policy.is_slow(Duration::from_millis(10)));
        assert!(policy.is_slow(Duration::from_millis(11)));
    }
}
