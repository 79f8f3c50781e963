//! Engine timeline.
//!
//! Every timestamp in the engine (beat times, voice onsets, activity checks) is
//! read from one [`ClockSource`], expressed in seconds since the clock's epoch.
//! Production code uses [`SystemClock`]; tests inject a [`ManualClock`] and
//! advance logical time without real audio hardware.

use crate::AtomicDouble;
use std::time::Instant;

/// Source of engine time in seconds.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Monotonic wall clock, zeroed at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    #[inline]
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Clock that only moves when told to.
///
/// # Example
/// ```
/// use neurobeat_core::{ClockSource, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(0.5);
/// assert_eq!(clock.now(), 0.5);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicDouble,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(seconds: f64) -> Self {
        Self {
            now: AtomicDouble::new(seconds),
        }
    }

    /// Move time forward by `seconds` and return the new time.
    pub fn advance(&self, seconds: f64) -> f64 {
        self.now.fetch_add(seconds) + seconds
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }
}

impl ClockSource for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.now.get()
    }
}
