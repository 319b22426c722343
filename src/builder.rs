//! Builder API for ergonomic breaker configuration

use std::sync::Arc;
use std::time::Duration;

use crate::breaker::CircuitBreaker;
use crate::callbacks::Callbacks;
use crate::clock::Clock;
use crate::errors::PolicyError;
use crate::policy::{Policy, WindowKind};

/// Fluent builder for [`CircuitBreaker`]
///
/// Starts from [`Policy::default`]; every knob can be overridden
/// individually or wholesale via [`policy`](Self::policy). The policy is
/// validated once in [`build`](Self::build).
pub struct CircuitBuilder {
    name: String,
    policy: Policy,
    clock: Option<Arc<dyn Clock>>,
    callbacks: Callbacks,
}

impl CircuitBuilder {
    /// Create a builder for a breaker with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: Policy::default(),
            clock: None,
            callbacks: Callbacks::new(),
        }
    }

    /// Replace the entire policy in one step
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Percentage (0-100) of failed calls at which the circuit trips
    pub fn failure_rate_threshold(mut self, percent: u8) -> Self {
        self.policy.failure_rate_threshold = percent;
        self
    }

    /// Percentage (0-100) of slow calls at which the circuit trips
    pub fn slow_call_rate_threshold(mut self, percent: u8) -> Self {
        self.policy.slow_call_rate_threshold = percent;
        self
    }

    /// Select the window variant and its size (samples or seconds)
    pub fn sliding_window(mut self, kind: WindowKind, size: u32) -> Self {
        self.policy.window_kind = kind;
        self.policy.sliding_window_size = size;
        self
    }

    /// Minimum recorded calls before rates are evaluated
    pub fn minimum_number_of_calls(mut self, calls: u32) -> Self {
        self.policy.minimum_number_of_calls = calls;
        self
    }

    /// Probe budget per HalfOpen episode
    pub fn permitted_calls_in_half_open(mut self, calls: u32) -> Self {
        self.policy.permitted_calls_in_half_open = calls;
        self
    }

    /// Calls lasting strictly longer than this count as slow
    pub fn slow_call_duration_threshold(mut self, threshold: Duration) -> Self {
        self.policy.slow_call_duration_threshold = threshold;
        self
    }

    /// How long Open persists before probing begins
    pub fn wait_duration_in_open(mut self, wait: Duration) -> Self {
        self.policy.wait_duration_in_open = wait;
        self
    }

    /// Safety timeout for HalfOpen episodes; zero disables
    pub fn max_wait_duration_in_half_open(mut self, wait: Duration) -> Self {
        self.policy.max_wait_duration_in_half_open = wait;
        self
    }

    /// Substitute the time source (tests inject a
    /// [`ManualClock`](crate::ManualClock) here)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Hook invoked when the circuit trips open
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_open = Some(Arc::new(f));
        self
    }

    /// Hook invoked when the circuit closes
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    /// Hook invoked when probing begins
    pub fn on_half_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_half_open = Some(Arc::new(f));
        self
    }

    /// Validate the policy and build the breaker
    pub fn build(self) -> Result<CircuitBreaker, PolicyError> {
        self.policy.validate()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(crate::clock::SystemClock::new()));
        Ok(CircuitBreaker::assemble(
            self.name,
            self.policy,
            clock,
            self.callbacks,
        ))
    }
}
