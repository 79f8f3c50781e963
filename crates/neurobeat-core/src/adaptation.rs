//! Between-session tempo progression.
//!
//! A pure rule over the current tempo and the latest sync accuracy: ease the
//! tempo down when the patient struggles, nudge it up when they lock on. The
//! engine never applies a suggestion by itself.

use serde::{Deserialize, Serialize};

/// Result of [`TempoAdvisor::suggest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoSuggestion {
    pub bpm: u32,
    /// True when `bpm` differs from the tempo passed in.
    pub adjusted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoAdvisor {
    /// Accuracy below which the tempo is lowered.
    pub low_accuracy: f64,
    /// Accuracy above which the tempo is raised.
    pub high_accuracy: f64,
    pub step_down: u32,
    pub step_up: u32,
    /// Lowest tempo a step down may reach.
    pub floor_bpm: u32,
    /// Highest tempo a step up may reach.
    pub ceiling_bpm: u32,
}

impl Default for TempoAdvisor {
    fn default() -> Self {
        Self {
            low_accuracy: 70.0,
            high_accuracy: 90.0,
            step_down: 2,
            step_up: 1,
            floor_bpm: 40,
            ceiling_bpm: 120,
        }
    }
}

impl TempoAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suggest the next tempo for `current_bpm` given `accuracy` (0-100).
    ///
    /// Note the ceiling also applies to a tempo already above it: a fast,
    /// accurate session is pulled back to `ceiling_bpm`.
    pub fn suggest(&self, current_bpm: u32, accuracy: f64) -> TempoSuggestion {
        let bpm = if accuracy < self.low_accuracy {
            current_bpm.saturating_sub(self.step_down).max(self.floor_bpm)
        } else if accuracy > self.high_accuracy {
            current_bpm.saturating_add(self.step_up).min(self.ceiling_bpm)
        } else {
            current_bpm
        };

        TempoSuggestion {
            bpm,
            adjusted: bpm != current_bpm,
        }
    }
}
