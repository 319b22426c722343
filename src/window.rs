//! Sliding-window outcome aggregation
//!
//! This module provides the two window implementations that feed the
//! breaker's rate evaluation:
//! - [`CountWindow`]: retains the last N samples in a ring of N slots
//! - [`TimeWindow`]: retains samples from the last N seconds in N
//!   one-second buckets
//!
//! Both are O(1) amortised per call and hold memory proportional to the
//! configured window size. Individual samples are absorbed into running
//! aggregates; only their classification flags survive.

use std::time::Duration;

/// A classified observation handed to the window by the breaker.
///
/// Classification happens before the window sees the sample: `failed`
/// reflects the reported outcome, `slow` whether the call exceeded the
/// slow-call duration threshold. A sample may be both. `at` is the clock
/// reading taken by the operation that recorded it.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub failed: bool,
    pub slow: bool,
    pub at: Duration,
}

/// Aggregate counters over the retained samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total: u64,
    pub failed: u64,
    pub slow: u64,
}

impl Totals {
    pub(crate) fn observe(&mut self, failed: bool, slow: bool) {
        self.total += 1;
        if failed {
            self.failed += 1;
        }
        if slow {
            self.slow += 1;
        }
    }

    pub(crate) fn discard(&mut self, failed: bool, slow: bool) {
        self.total -= 1;
        if failed {
            self.failed -= 1;
        }
        if slow {
            self.slow -= 1;
        }
    }

    pub(crate) fn subtract(&mut self, other: &Totals) {
        self.total -= other.total;
        self.failed -= other.failed;
        self.slow -= other.slow;
    }
}

/// Common contract of the two window variants.
///
/// `snapshot` takes the caller's clock reading so that eviction and any
/// deadline checks in the same operation share a single observation.
pub trait SlidingWindow: Send + std::fmt::Debug {
    /// Absorb a new sample
    fn record(&mut self, sample: &Sample);

    /// Return current aggregates, evicting expired samples first
    fn snapshot(&mut self, now: Duration) -> Totals;

    /// Drop all retained samples and zero the counters
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    failed: bool,
    slow: bool,
}

/// Ring of the last N samples.
///
/// `record` overwrites the oldest slot, removing its contribution from
/// the running aggregate before adding the new sample's. Time never
/// evicts anything here; until N samples have been recorded the
/// aggregate reflects only the slots actually written.
#[derive(Debug)]
pub struct CountWindow {
    slots: Vec<Option<Slot>>,
    cursor: usize,
    totals: Totals,
}

impl CountWindow {
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn new(size: u32) -> Self {
        assert!(size > 0, "window size must be greater than 0");
        Self {
            slots: vec![None; size as usize],
            cursor: 0,
            totals: Totals::default(),
        }
    }
}

impl SlidingWindow for CountWindow {
    fn record(&mut self, sample: &Sample) {
        if let Some(evicted) = self.slots[self.cursor].take() {
            self.totals.discard(evicted.failed, evicted.slow);
        }
        self.slots[self.cursor] = Some(Slot {
            failed: sample.failed,
            slow: sample.slow,
        });
        self.totals.observe(sample.failed, sample.slow);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    fn snapshot(&mut self, _now: Duration) -> Totals {
        self.totals
    }

    fn reset(&mut self) {
        self.slots.fill(None);
        self.cursor = 0;
        self.totals = Totals::default();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    /// Epoch second the bucket currently aggregates, `None` when empty
    epoch: Option<u64>,
    totals: Totals,
}

/// N one-second buckets over the last N seconds.
///
/// A sample recorded at time `t` lands in bucket `floor(t) mod N`. A
/// bucket whose epoch lags the current second by N or more is stale and
/// is flushed from the running aggregate, either when `record` reuses
/// its slot or during the full sweep in `snapshot`. Sub-second ordering
/// within a bucket is irrelevant.
#[derive(Debug)]
pub struct TimeWindow {
    buckets: Vec<Bucket>,
    span_secs: u64,
    totals: Totals,
}

impl TimeWindow {
    /// # Panics
    ///
    /// Panics if `span_secs` is 0.
    pub fn new(span_secs: u32) -> Self {
        assert!(span_secs > 0, "window span must be greater than 0");
        Self {
            buckets: vec![Bucket::default(); span_secs as usize],
            span_secs: u64::from(span_secs),
            totals: Totals::default(),
        }
    }

    fn flush(totals: &mut Totals, bucket: &mut Bucket) {
        totals.subtract(&bucket.totals);
        *bucket = Bucket::default();
    }
}

impl SlidingWindow for TimeWindow {
    fn record(&mut self, sample: &Sample) {
        let epoch = sample.at.as_secs();
        let bucket = &mut self.buckets[(epoch % self.span_secs) as usize];

        if bucket.epoch != Some(epoch) {
            Self::flush(&mut self.totals, bucket);
            bucket.epoch = Some(epoch);
        }
        bucket.totals.observe(sample.failed, sample.slow);
        self.totals.observe(sample.failed, sample.slow);
    }

    fn snapshot(&mut self, now: Duration) -> Totals {
        let current = now.as_secs();
        for bucket in &mut self.buckets {
            // saturating_sub treats a backwards clock jump as no elapsed time
            if let Some(epoch) = bucket.epoch
                && current.saturating_sub(epoch) >= self.span_secs
            {
                Self::flush(&mut self.totals, bucket);
            }
        }
        self.totals
    }

    fn reset(&mut self) {
        self.buckets.fill(Bucket::default());
        self.totals = Totals::default();
    }
}
