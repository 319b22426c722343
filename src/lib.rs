//! Switchgear - windowed circuit breaker
//!
//! This crate provides a complete in-process circuit breaker with:
//! - Two interchangeable sliding-window aggregators (count-based and
//!   time-based) behind one contract
//! - A concurrent state machine (Closed → Open → HalfOpen) driven by
//!   failure rate and slow-call rate thresholds
//! - Per-breaker injectable clocks so every transition is testable
//!   without sleeping
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use switchgear::{CircuitBreaker, WindowKind};
//!
//! let breaker = CircuitBreaker::builder("billing")
//!     .failure_rate_threshold(50)
//!     .sliding_window(WindowKind::CountBased, 10)
//!     .minimum_number_of_calls(5)
//!     .wait_duration_in_open(Duration::from_secs(30))
//!     .on_open(|name| eprintln!("circuit {name} opened!"))
//!     .build()
//!     .expect("policy is valid");
//!
//! // Gate a call, then report how it went.
//! if breaker.acquire_permission() {
//!     // ... perform the outbound call ...
//!     breaker.record_success(Duration::from_millis(3));
//! }
//!
//! // Or let the breaker drive the whole exchange.
//! let result = breaker.call(|| {
//!     Ok::<_, String>("response")
//! });
//! assert!(result.is_ok());
//! ```

pub mod breaker;
pub mod builder;
pub mod callbacks;
pub mod clock;
pub mod errors;
pub mod policy;
pub mod window;

pub use breaker::{CircuitBreaker, State};
pub use builder::CircuitBuilder;
pub use callbacks::Callbacks;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{CircuitError, PolicyError};
pub use policy::{Policy, WindowKind};
pub use window::{CountWindow, Sample, SlidingWindow, TimeWindow, Totals};

/// Outcome of a guarded call as reported by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Whether this outcome counts toward the failure rate
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Failure)
    }
}
