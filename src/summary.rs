//! Session summary handed to whatever persists completed sessions.

use neurobeat_core::{SessionMode, Timbre};
use serde::{Deserialize, Serialize};

/// Snapshot of the current (or last finished) playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_mode: SessionMode,
    pub timbre: Timbre,
    /// Tempo the session started at.
    pub initial_bpm: u32,
    /// Tempo at the end of the session, or now if it is still running.
    pub final_bpm: u32,
    /// Engine-clock seconds between start and stop, excluding pauses.
    pub duration_secs: f64,
    pub beats_emitted: u64,
    /// Rounded voice sync accuracy, `0..=100`.
    pub accuracy_score: u8,
}

/// Accumulates session timing across pause/resume.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionTracker {
    initial_bpm: u32,
    started_at: Option<f64>,
    accumulated: f64,
    finished: bool,
}

impl SessionTracker {
    pub(crate) fn begin(&mut self, bpm: u32, now: f64) {
        *self = Self {
            initial_bpm: bpm,
            started_at: Some(now),
            accumulated: 0.0,
            finished: false,
        };
    }

    /// Close the running segment (pause or stop).
    pub(crate) fn suspend(&mut self, now: f64) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += (now - started).max(0.0);
        }
    }

    pub(crate) fn resume(&mut self, now: f64) {
        if self.started_at.is_none() && !self.finished {
            self.started_at = Some(now);
        }
    }

    pub(crate) fn finish(&mut self, now: f64) {
        self.suspend(now);
        self.finished = true;
    }

    pub(crate) fn initial_bpm(&self) -> Option<u32> {
        (self.started_at.is_some() || self.accumulated > 0.0 || self.finished)
            .then_some(self.initial_bpm)
    }

    pub(crate) fn duration(&self, now: f64) -> f64 {
        let running = self.started_at.map_or(0.0, |started| (now - started).max(0.0));
        self.accumulated + running
    }
}
