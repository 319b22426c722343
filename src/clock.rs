//! Injectable time sources
//!
//! Every time observation the breaker makes goes through a [`Clock`], so
//! tests can advance time deterministically instead of sleeping. The
//! default [`SystemClock`] anchors an `Instant` at construction, which
//! keeps readings monotonic regardless of NTP adjustments.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source, read as elapsed time since a fixed origin.
///
/// Readings are expected to be non-decreasing between successive calls.
/// Consumers treat a backwards jump as "no time has passed".
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Duration;
}

/// Production clock backed by [`Instant`]
#[derive(Debug)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.anchor.elapsed()
    }
}

/// Hand-driven clock for tests
///
/// Cloned handles share the same underlying reading, so a handle kept by
/// the test can advance time for a breaker that owns another handle.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use switchgear::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// assert_eq!(clock.now(), Duration::ZERO);
///
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    reading: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock with an initial reading
    pub fn starting_at(reading: Duration) -> Self {
        Self {
            reading: Arc::new(Mutex::new(reading)),
        }
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        *self.reading.lock() += delta;
    }

    /// Set the clock to an absolute reading
    pub fn set(&self, reading: Duration) {
        *self.reading.lock() = reading;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.reading.lock()
    }
}
