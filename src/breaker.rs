//! Circuit breaker state machine
//!
//! The breaker is a concurrent decision object: workers call
//! [`CircuitBreaker::acquire_permission`] before an outbound call and
//! [`CircuitBreaker::record`] (or one of its shorthands) afterwards. All
//! mutable state sits behind one mutex; each operation locks once, takes
//! a single clock observation, and evaluates transitions within that
//! critical section. Time-driven transitions (Open → HalfOpen, and the
//! HalfOpen safety timeout) are applied lazily on `acquire_permission`
//! and `state`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Outcome;
use crate::builder::CircuitBuilder;
use crate::callbacks::Callbacks;
use crate::clock::{Clock, SystemClock};
use crate::errors::{CircuitError, PolicyError};
use crate::policy::Policy;
use crate::window::{Sample, SlidingWindow, Totals};

/// Externally visible breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Traffic flows; outcomes feed the sliding window
    Closed,
    /// Traffic is refused until the open deadline passes
    Open,
    /// A bounded number of probe calls assess recovery
    HalfOpen,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Closed => "Closed",
            State::Open => "Open",
            State::HalfOpen => "HalfOpen",
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenPhase {
    opened_at: Duration,
}

#[derive(Debug, Clone, Copy)]
struct HalfOpenPhase {
    entered_at: Duration,
    /// Remaining probe permissions in this episode
    permits: u32,
    /// Outcomes recorded since entering HalfOpen
    probes: Totals,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open(OpenPhase),
    HalfOpen(HalfOpenPhase),
}

impl Phase {
    fn state(&self) -> State {
        match self {
            Phase::Closed => State::Closed,
            Phase::Open(_) => State::Open,
            Phase::HalfOpen(_) => State::HalfOpen,
        }
    }
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    window: Box<dyn SlidingWindow>,
}

impl Inner {
    /// Apply the entry actions for `to` and switch phases.
    ///
    /// Entering Closed or HalfOpen empties the window (HalfOpen
    /// decisions use only their own probes); entering Open keeps it.
    fn enter(&mut self, policy: &Policy, to: State, now: Duration) {
        self.phase = match to {
            State::Closed => {
                self.window.reset();
                Phase::Closed
            }
            State::Open => Phase::Open(OpenPhase { opened_at: now }),
            State::HalfOpen => {
                self.window.reset();
                Phase::HalfOpen(HalfOpenPhase {
                    entered_at: now,
                    permits: policy.permitted_calls_in_half_open,
                    probes: Totals::default(),
                })
            }
        };
    }
}

/// A windowed circuit breaker.
///
/// Safe to share across threads behind an `Arc`; every operation works
/// through `&self` and completes in bounded time.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    policy: Policy,
    clock: Arc<dyn Clock>,
    callbacks: Callbacks,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a breaker with the default system clock.
    ///
    /// Fails if the policy does not validate; see
    /// [`Policy::validate`](crate::Policy::validate).
    pub fn new(name: impl Into<String>, policy: Policy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self::assemble(
            name.into(),
            policy,
            Arc::new(SystemClock::new()),
            Callbacks::new(),
        ))
    }

    /// Create a breaker builder (clock injection, hooks, policy knobs)
    pub fn builder(name: impl Into<String>) -> CircuitBuilder {
        CircuitBuilder::new(name)
    }

    /// Used by the builder once the policy has been validated
    pub(crate) fn assemble(
        name: String,
        policy: Policy,
        clock: Arc<dyn Clock>,
        callbacks: Callbacks,
    ) -> Self {
        let window = policy.make_window();
        Self {
            name,
            policy,
            clock,
            callbacks,
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                window,
            }),
        }
    }

    /// Ask whether a call may proceed.
    ///
    /// Closed always grants. Open refuses until the wait deadline has
    /// passed; the request that crosses the deadline performs the
    /// transition and is admitted as the first probe. HalfOpen grants
    /// while probe permits remain, consuming one per grant.
    pub fn acquire_permission(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.advance_deadlines(&mut inner, now);

        match &mut inner.phase {
            Phase::Closed => true,
            Phase::Open(_) => false,
            Phase::HalfOpen(half) => {
                if half.permits > 0 {
                    half.permits -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Report the outcome of a previously permitted call.
    ///
    /// The sample is classified (failed per the outcome, slow iff
    /// `elapsed` exceeds the policy threshold) and absorbed into the
    /// window. In Closed the rates are re-evaluated against the window;
    /// in HalfOpen the probe tally is updated and a verdict is reached
    /// once the permitted number of probes has reported. Results
    /// arriving while Open are tallied but drive no transition.
    pub fn record(&self, outcome: Outcome, elapsed: Duration) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        let sample = Sample {
            failed: outcome.is_failure(),
            slow: self.policy.is_slow(elapsed),
            at: now,
        };
        inner.window.record(&sample);

        let next = match &mut inner.phase {
            Phase::Closed => {
                let snap = inner.window.snapshot(now);
                (snap.total >= u64::from(self.policy.minimum_number_of_calls)
                    && self.policy.breaches(&snap))
                .then_some(State::Open)
            }
            Phase::HalfOpen(half) => {
                let quorum = u64::from(self.policy.permitted_calls_in_half_open);
                if half.probes.total < quorum {
                    half.probes.observe(sample.failed, sample.slow);
                }
                if half.probes.total >= quorum {
                    Some(if self.policy.breaches(&half.probes) {
                        State::Open
                    } else {
                        State::Closed
                    })
                } else {
                    None
                }
            }
            Phase::Open(_) => None,
        };

        if let Some(to) = next {
            self.transition(inner, to, now);
        }
    }

    /// Shorthand for [`record`](Self::record) with [`Outcome::Success`]
    pub fn record_success(&self, elapsed: Duration) {
        self.record(Outcome::Success, elapsed);
    }

    /// Shorthand for [`record`](Self::record) with [`Outcome::Failure`]
    pub fn record_failure(&self, elapsed: Duration) {
        self.record(Outcome::Failure, elapsed);
    }

    /// Report a call outcome from a `Result` (`Err` counts as failure)
    pub fn record_result<T, E>(&self, result: &Result<T, E>, elapsed: Duration) {
        let outcome = match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        };
        self.record(outcome, elapsed);
    }

    /// Current state, after applying any pending time-driven transition
    pub fn state(&self) -> State {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.advance_deadlines(&mut inner, now);
        inner.phase.state()
    }

    /// Force a transition, for tests and administrative overrides.
    ///
    /// The breaker behaves as if it freshly entered `state`: the window
    /// is emptied and all auxiliary counters reset. Transition hooks do
    /// not fire for forced changes.
    pub fn set_state(&self, state: State) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.window.reset();
        inner.enter(&self.policy, state, now);
        tracing::debug!(circuit = %self.name, %state, "state forced");
    }

    /// Execute a fallible operation under the breaker's protection.
    ///
    /// Acquires permission, times the closure through the injected
    /// clock, and records the outcome. Refusals surface as
    /// [`CircuitError::Rejected`]; the closure's own error is wrapped in
    /// [`CircuitError::Execution`].
    pub fn call<T, E, F>(&self, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.acquire_permission() {
            return Err(CircuitError::Rejected {
                circuit: self.name.clone(),
            });
        }

        let started = self.clock.now();
        let result = f();
        let elapsed = self.clock.now().saturating_sub(started);

        match result {
            Ok(value) => {
                self.record(Outcome::Success, elapsed);
                Ok(value)
            }
            Err(error) => {
                self.record(Outcome::Failure, elapsed);
                Err(CircuitError::Execution(error))
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == State::Closed
    }

    pub fn is_open(&self) -> bool {
        self.state() == State::Open
    }

    pub fn is_half_open(&self) -> bool {
        self.state() == State::HalfOpen
    }

    /// Breaker name, carried into logs and hook invocations
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated policy this breaker runs with
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Apply lazily evaluated time-driven transitions.
    ///
    /// Uses the caller's single clock observation for every deadline
    /// comparison. Deadline math saturates, so a backwards clock jump
    /// reads as no elapsed time.
    fn advance_deadlines(&self, inner: &mut Inner, now: Duration) {
        if let Phase::Open(open) = inner.phase
            && now.saturating_sub(open.opened_at) >= self.policy.wait_duration_in_open
        {
            self.transition(inner, State::HalfOpen, now);
        }

        let max_wait = self.policy.max_wait_duration_in_half_open;
        if max_wait.is_zero() {
            return;
        }
        if let Phase::HalfOpen(half) = inner.phase
            && half.probes.total < u64::from(self.policy.permitted_calls_in_half_open)
            && now.saturating_sub(half.entered_at) >= max_wait
        {
            self.transition(inner, State::Open, now);
        }
    }

    fn transition(&self, inner: &mut Inner, to: State, now: Duration) {
        let from = inner.phase.state();
        inner.enter(&self.policy, to, now);

        match to {
            State::Open => {
                tracing::warn!(circuit = %self.name, %from, "circuit opened");
                self.callbacks.opened(&self.name);
            }
            State::HalfOpen => {
                tracing::debug!(circuit = %self.name, %from, "circuit half-open, probing");
                self.callbacks.half_opened(&self.name);
            }
            State::Closed => {
                tracing::debug!(circuit = %self.name, %from, "circuit closed");
                self.callbacks.closed(&self.name);
            }
        }
    }
}
