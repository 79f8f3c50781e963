//! Beat timbre names.
//!
//! The closed set of sounds the transport can select. Synthesis parameters for
//! each variant live in `neurobeat-synth`; the transport only needs the name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timbre {
    /// Short triangle click. The default.
    #[default]
    Metronome,
    /// Rounder sine click sharing the metronome voice.
    SoftBeat,
    Drum,
    SoftBell,
    WoodenBlock,
    Piano,
}

impl Timbre {
    pub const ALL: [Timbre; 6] = [
        Timbre::Metronome,
        Timbre::SoftBeat,
        Timbre::Drum,
        Timbre::SoftBell,
        Timbre::WoodenBlock,
        Timbre::Piano,
    ];

    /// Parse a wire name. Unknown names fall back to `Metronome`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "soft_beat" | "softbeat" => Timbre::SoftBeat,
            "drum" => Timbre::Drum,
            "soft_bell" | "softbell" => Timbre::SoftBell,
            "wooden_block" | "woodenblock" => Timbre::WoodenBlock,
            "piano" => Timbre::Piano,
            _ => Timbre::Metronome,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Timbre::Metronome => "metronome",
            Timbre::SoftBeat => "soft_beat",
            Timbre::Drum => "drum",
            Timbre::SoftBell => "soft_bell",
            Timbre::WoodenBlock => "wooden_block",
            Timbre::Piano => "piano",
        }
    }

    /// `Metronome` and `SoftBeat` are two variants of one logical instrument.
    #[inline]
    pub const fn is_metronome_variant(self) -> bool {
        matches!(self, Timbre::Metronome | Timbre::SoftBeat)
    }
}

impl From<u8> for Timbre {
    fn from(value: u8) -> Self {
        match value {
            1 => Timbre::SoftBeat,
            2 => Timbre::Drum,
            3 => Timbre::SoftBell,
            4 => Timbre::WoodenBlock,
            5 => Timbre::Piano,
            _ => Timbre::Metronome,
        }
    }
}

impl From<Timbre> for u8 {
    fn from(timbre: Timbre) -> Self {
        timbre as u8
    }
}

impl core::fmt::Display for Timbre {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
