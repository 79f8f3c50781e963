//! Therapy session modes and the tempo range each one allows.

use serde::{Deserialize, Serialize};

/// Inclusive tempo bounds in BPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoRange {
    pub min: u32,
    pub max: u32,
}

impl TempoRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Clamp an arbitrary (possibly negative) tempo request into range.
    #[inline]
    pub fn clamp(&self, bpm: i64) -> u32 {
        bpm.clamp(self.min as i64, self.max as i64) as u32
    }

    #[inline]
    pub fn contains(&self, bpm: u32) -> bool {
        (self.min..=self.max).contains(&bpm)
    }
}

/// Therapy context. Determines the valid tempo range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Walking/stepping cadence training.
    #[default]
    GaitTrainer,
    /// Syllable pacing for speech therapy.
    SpeechRhythm,
}

impl SessionMode {
    pub const fn tempo_range(self) -> TempoRange {
        match self {
            SessionMode::GaitTrainer => TempoRange::new(40, 200),
            SessionMode::SpeechRhythm => TempoRange::new(80, 180),
        }
    }

    /// Parse a wire name, falling back to `GaitTrainer` for anything unknown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "speech_rhythm" | "speech-rhythm" | "speechrhythm" => SessionMode::SpeechRhythm,
            _ => SessionMode::GaitTrainer,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionMode::GaitTrainer => "gait_trainer",
            SessionMode::SpeechRhythm => "speech_rhythm",
        }
    }
}

impl From<u8> for SessionMode {
    fn from(value: u8) -> Self {
        match value {
            1 => SessionMode::SpeechRhythm,
            _ => SessionMode::GaitTrainer,
        }
    }
}

impl From<SessionMode> for u8 {
    fn from(mode: SessionMode) -> Self {
        match mode {
            SessionMode::GaitTrainer => 0,
            SessionMode::SpeechRhythm => 1,
        }
    }
}
