//! Timbre bank for neurobeat.
//!
//! - **[`Patch`]** - the fixed patch table, one entry per [`Timbre`](neurobeat_core::Timbre)
//! - **[`TimbreBank`]** - control handle; the transport's beat trigger
//! - **[`BankRenderer`]** - audio-thread renderer owning every voice
//! - **[`Voice`]** - one FunDSP oscillator and envelope chain
//!
//! # Example
//!
//! ```
//! use neurobeat_core::{AudioRenderer, Timbre};
//! use neurobeat_synth::TimbreBank;
//!
//! let (bank, mut renderer) = TimbreBank::new(44100.0, Timbre::Metronome)?;
//! bank.trigger_note(Timbre::Drum, 0.25)?;
//!
//! let mut block = vec![0.0f32; 2 * 512];
//! renderer.render(&mut block);
//! assert!(block.iter().any(|s| *s != 0.0));
//! # Ok::<(), neurobeat_synth::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

mod patch;
pub use patch::{membrane_frequency, midi_to_hz, Adsr, NoteLength, Oscillator, Patch};

mod voice;
pub use voice::Voice;

mod bank;
pub use bank::{
    db_to_amplitude, gain_to_db, BankRenderer, TimbreBank, VoiceCommand, VOICES_PER_INSTRUMENT,
};
