//! The timbre patch table.

use neurobeat_core::Timbre;

/// Oscillator model for a patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Oscillator {
    Sine,
    Triangle,
    /// Triangle whose pitch falls exponentially from `pitch * octaves` to
    /// `pitch` over `pitch_decay` seconds.
    Membrane { octaves: f32, pitch_decay: f32 },
    /// Low-passed white noise. Unpitched.
    BrownNoise,
}

/// Envelope times in seconds, sustain as a level in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

/// Gate length relative to the beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLength {
    Eighth,
    Sixteenth,
}

impl NoteLength {
    /// Gate duration in seconds at `bpm`.
    pub fn seconds(self, bpm: u32) -> f32 {
        let beat = 60.0 / bpm.max(1) as f32;
        match self {
            NoteLength::Eighth => beat / 2.0,
            NoteLength::Sixteenth => beat / 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    pub timbre: Timbre,
    pub oscillator: Oscillator,
    pub envelope: Adsr,
    /// MIDI note, `None` for unpitched sources.
    pub note: Option<u8>,
    pub length: NoteLength,
    /// Output level before volume control.
    pub level: f32,
}

impl Patch {
    pub const fn for_timbre(timbre: Timbre) -> Patch {
        match timbre {
            Timbre::Metronome => Patch {
                timbre,
                oscillator: Oscillator::Triangle,
                envelope: Adsr::new(0.005, 0.1, 0.0, 0.1),
                note: Some(72),
                length: NoteLength::Eighth,
                level: 0.6,
            },
            Timbre::SoftBeat => Patch {
                timbre,
                oscillator: Oscillator::Sine,
                envelope: Adsr::new(0.02, 0.3, 0.0, 0.2),
                note: Some(72),
                length: NoteLength::Eighth,
                level: 0.6,
            },
            Timbre::Drum => Patch {
                timbre,
                oscillator: Oscillator::Membrane {
                    octaves: 2.0,
                    pitch_decay: 0.05,
                },
                envelope: Adsr::new(0.001, 0.4, 0.01, 1.4),
                note: Some(36),
                length: NoteLength::Sixteenth,
                level: 0.8,
            },
            Timbre::SoftBell => Patch {
                timbre,
                oscillator: Oscillator::Sine,
                envelope: Adsr::new(0.02, 0.3, 0.1, 0.8),
                note: Some(84),
                length: NoteLength::Eighth,
                level: 0.5,
            },
            Timbre::WoodenBlock => Patch {
                timbre,
                oscillator: Oscillator::BrownNoise,
                envelope: Adsr::new(0.001, 0.1, 0.0, 0.05),
                note: None,
                length: NoteLength::Eighth,
                level: 0.7,
            },
            Timbre::Piano => Patch {
                timbre,
                oscillator: Oscillator::Triangle,
                envelope: Adsr::new(0.008, 0.2, 0.3, 1.2),
                note: Some(60),
                length: NoteLength::Eighth,
                level: 0.5,
            },
        }
    }

    /// Base frequency in Hz, or 0 for unpitched patches.
    pub fn frequency(&self) -> f32 {
        self.note.map(midi_to_hz).unwrap_or(0.0)
    }
}

/// Equal-tempered frequency of a MIDI note (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Exponential sweep from `base * octaves` down to `base` over `pitch_decay`.
#[inline]
pub fn membrane_frequency(base: f32, octaves: f32, pitch_decay: f32, elapsed: f32) -> f32 {
    if elapsed >= pitch_decay || pitch_decay <= 0.0 {
        return base;
    }
    base * octaves.powf(1.0 - elapsed / pitch_decay)
}
