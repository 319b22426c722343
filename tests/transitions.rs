//! End-to-end state transition suite
//!
//! Drives a breaker through the full Closed → Open → HalfOpen cycle for
//! both window kinds with a hand-driven clock: trip on failure rate,
//! recover through probes, trip on slow-call rate, relapse on slow
//! probes, then the window-kind-specific eviction behaviour.

use std::sync::Arc;
use std::time::Duration;

use switchgear::{CircuitBreaker, ManualClock, Policy, State, WindowKind};

const FAST: Duration = Duration::from_millis(1);
const SLOW: Duration = Duration::from_millis(11);

fn policy(kind: WindowKind) -> Policy {
    Policy {
        failure_rate_threshold: 50,
        slow_call_rate_threshold: 60,
        window_kind: kind,
        sliding_window_size: 20,
        minimum_number_of_calls: 10,
        permitted_calls_in_half_open: 5,
        slow_call_duration_threshold: Duration::from_millis(10),
        wait_duration_in_open: Duration::from_secs(5),
        max_wait_duration_in_half_open: Duration::from_secs(5),
    }
}

fn breaker(kind: WindowKind) -> (CircuitBreaker, ManualClock) {
    let clock = ManualClock::new();
    let breaker = CircuitBreaker::builder("upstream")
        .policy(policy(kind))
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("test policy should validate");
    (breaker, clock)
}

/// The cycle both window kinds must share when the clock never moves
/// inside a window's span.
fn run_shared_cycle(breaker: &CircuitBreaker, clock: &ManualClock) {
    // Ten clean calls, then ten failures
    for i in 0..10 {
        assert!(breaker.acquire_permission(), "success {i} should be admitted");
        breaker.record_success(FAST);
    }
    for i in 0..10 {
        assert!(breaker.acquire_permission(), "failure {i} should be admitted");
        breaker.record_failure(FAST);
    }

    // 10 of 20 failed hits the 50% threshold exactly
    assert_eq!(breaker.state(), State::Open);
    assert!(!breaker.acquire_permission());

    // Probing opens after the wait; five clean probes close the circuit
    clock.advance(Duration::from_secs(5));
    for i in 0..5 {
        assert!(breaker.acquire_permission(), "probe {i} should be admitted");
        assert_eq!(breaker.state(), State::HalfOpen);
        breaker.record_success(FAST);
    }
    assert_eq!(breaker.state(), State::Closed);
    assert!(breaker.acquire_permission());

    // Slow calls trip the circuit even when every call succeeds
    for i in 0..8 {
        assert!(breaker.acquire_permission(), "fast call {i} should be admitted");
        breaker.record_success(FAST);
    }
    for i in 0..12 {
        assert!(breaker.acquire_permission(), "slow call {i} should be admitted");
        breaker.record_success(SLOW);
    }
    assert_eq!(breaker.state(), State::Open);
    assert!(!breaker.acquire_permission());

    // Slow probes send it straight back to Open
    clock.advance(Duration::from_secs(5));
    for i in 0..5 {
        assert!(breaker.acquire_permission(), "probe {i} should be admitted");
        assert_eq!(breaker.state(), State::HalfOpen);
        breaker.record_success(SLOW);
    }
    assert_eq!(breaker.state(), State::Open);
    assert!(!breaker.acquire_permission());
}

#[test]
fn count_based_cycle_and_eviction() {
    let (breaker, clock) = breaker(WindowKind::CountBased);
    run_shared_cycle(&breaker, &clock);

    breaker.set_state(State::Closed);

    // 12 successes and 10 failures: the ring holds only the last 20,
    // so the two oldest successes fall out and 10/20 trips the breaker.
    for i in 0..12 {
        assert!(breaker.acquire_permission(), "success {i} should be admitted");
        assert_eq!(breaker.state(), State::Closed);
        breaker.record_success(FAST);
    }
    for i in 0..10 {
        assert!(breaker.acquire_permission(), "failure {i} should be admitted");
        assert_eq!(breaker.state(), State::Closed);
        breaker.record_failure(FAST);
    }
    assert_eq!(breaker.state(), State::Open);
}

#[test]
fn time_based_cycle_and_eviction() {
    let (breaker, clock) = breaker(WindowKind::TimeBased);
    run_shared_cycle(&breaker, &clock);

    breaker.set_state(State::Closed);

    // Spread 12 successes over six seconds, then burst 10 failures:
    // 10 of 22 stays under 50%, the circuit holds.
    for i in 0..12 {
        assert!(breaker.acquire_permission(), "success {i} should be admitted");
        assert_eq!(breaker.state(), State::Closed);
        breaker.record_success(FAST);
        clock.advance(Duration::from_millis(500));
    }
    for i in 0..10 {
        assert!(breaker.acquire_permission(), "failure {i} should be admitted");
        assert_eq!(breaker.state(), State::Closed);
        breaker.record_failure(FAST);
    }
    assert_eq!(breaker.state(), State::Closed);

    // Waiting ages the early successes out of the window; the next
    // sample re-evaluates with the failures now dominant.
    clock.advance(Duration::from_millis(15_500));
    breaker.record_success(FAST);
    assert_eq!(breaker.state(), State::Open);
}

#[test]
fn time_based_window_drains_after_full_span() {
    let (breaker, clock) = breaker(WindowKind::TimeBased);

    for _ in 0..9 {
        assert!(breaker.acquire_permission());
        breaker.record_failure(FAST);
    }
    assert_eq!(breaker.state(), State::Closed);

    // A full window span later those failures are gone: nine more
    // all-failure samples still sit below the minimum call count.
    clock.advance(Duration::from_secs(20));
    for _ in 0..9 {
        assert!(breaker.acquire_permission());
        breaker.record_failure(FAST);
        assert_eq!(breaker.state(), State::Closed);
    }
}

#[test]
fn forced_state_changes_start_fresh_episodes() {
    let (breaker, clock) = breaker(WindowKind::CountBased);

    breaker.set_state(State::Open);
    assert!(!breaker.acquire_permission());

    // The forced Open episode starts its wait from the forcing instant
    clock.advance(Duration::from_secs(5));
    assert!(breaker.acquire_permission());
    assert_eq!(breaker.state(), State::HalfOpen);

    breaker.set_state(State::Closed);
    assert!(breaker.acquire_permission());
    assert_eq!(breaker.state(), State::Closed);
}
