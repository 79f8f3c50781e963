//! Beat notification seams.
//!
//! The transport drives two collaborators per tick, in order and with the same
//! logical timestamp: a [`BeatTrigger`] that renders the audible beat, and an
//! optional [`BeatObserver`] supplied by the hosting UI for visual pulses.

use crate::Timbre;

/// One scheduled beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Zero-based beat count since the transport last started from stop.
    pub index: u64,
    /// Logical beat time on the engine clock, in seconds.
    pub time: f64,
    pub timbre: Timbre,
    pub bpm: u32,
}

impl BeatEvent {
    /// Seconds between this beat and the next one at the same tempo.
    #[inline]
    pub fn interval(&self) -> f64 {
        beat_interval(self.bpm)
    }
}

/// Quarter-note period for `bpm`.
#[inline]
pub fn beat_interval(bpm: u32) -> f64 {
    60.0 / bpm.max(1) as f64
}

/// Renders the audible part of a beat. Called with the transport lock held,
/// so implementations must not block.
pub trait BeatTrigger: Send + Sync {
    fn trigger(&self, event: &BeatEvent);
}

/// Receives a notification per beat, after the audio trigger.
pub trait BeatObserver: Send + Sync {
    fn on_beat(&self, event: &BeatEvent);
}

impl<F> BeatObserver for F
where
    F: Fn(&BeatEvent) + Send + Sync,
{
    fn on_beat(&self, event: &BeatEvent) {
        self(event)
    }
}
