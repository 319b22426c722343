//! Error types for breaker construction and guarded calls

use thiserror::Error;

/// Rejected configurations, reported once at construction
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{name} must lie within 0..=100, got {value}")]
    RateOutOfRange { name: &'static str, value: u8 },

    #[error("sliding window size must be greater than 0")]
    ZeroWindowSize,

    #[error("permitted calls in half-open must be greater than 0")]
    ZeroHalfOpenPermits,
}

/// Failure modes of [`CircuitBreaker::call`](crate::CircuitBreaker::call)
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// The breaker refused permission for the call
    #[error("circuit '{circuit}' refused the call")]
    Rejected { circuit: String },

    /// The wrapped operation itself failed
    #[error("guarded call failed: {0}")]
    Execution(E),
}
