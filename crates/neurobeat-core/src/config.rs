//! Engine configuration.

use crate::{Error, Result, SessionMode, Timbre};
use serde::{Deserialize, Serialize};

/// Configuration for the beat engine.
///
/// Deserializes with defaults for missing fields, so a partial JSON/TOML
/// document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate used by the headless backend and the synthesizer.
    pub sample_rate: f64,
    /// Tempo applied before the first `start`.
    pub initial_bpm: u32,
    pub session_mode: SessionMode,
    pub timbre: Timbre,
    /// RMS level (full scale = 1.0) above which a poll counts as a voice onset.
    pub voice_threshold: f32,
    /// Number of microphone samples analyzed per poll.
    pub waveform_size: usize,
    /// Voice polling cadence.
    pub poll_interval_ms: u64,
    /// Rhythm history retention.
    pub history_window_secs: f64,
    /// Recency window for `is_voice_active`.
    pub activity_window_secs: f64,
    /// Linear gain for the metronome voice.
    pub metronome_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            initial_bpm: 60,
            session_mode: SessionMode::GaitTrainer,
            timbre: Timbre::Metronome,
            voice_threshold: 0.01,
            waveform_size: 1024,
            poll_interval_ms: 16,
            history_window_secs: 10.0,
            activity_window_secs: 1.0,
            metronome_volume: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(self.voice_threshold.is_finite() && self.voice_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "voice_threshold {} must be a non-negative number",
                self.voice_threshold
            )));
        }
        if self.waveform_size == 0 {
            return Err(Error::InvalidConfig("waveform_size must be non-zero".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be non-zero".into(),
            ));
        }
        if !(self.history_window_secs > 0.0 && self.activity_window_secs > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "history/activity windows must be positive (got {} / {})",
                self.history_window_secs, self.activity_window_secs
            )));
        }
        if !(self.metronome_volume.is_finite() && self.metronome_volume >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "metronome_volume {} must be a non-negative number",
                self.metronome_volume
            )));
        }
        Ok(())
    }
}
