//! # neurobeat
//!
//! Beat scheduling and voice synchronization for rhythmic auditory stimulation.
//!
//! A [`BeatEngine`] plays a steady beat in one of several timbres, keeps the
//! tempo inside the range the current [`SessionMode`] allows, and listens to
//! the patient's voice to score how closely vocal onsets follow the beat.
//!
//! ## Quick Start
//!
//! ```
//! use neurobeat::prelude::*;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new());
//! let engine = BeatEngine::builder()
//!     .headless()
//!     .no_microphone()
//!     .clock(clock.clone())
//!     .manual_drive()
//!     .build()?;
//!
//! assert!(engine.initialize());
//! assert!(engine.start(90));
//! engine.set_sound_type(Timbre::Drum);
//!
//! engine.pump();
//! clock.advance(1.0);
//! engine.pump();
//! assert_eq!(engine.beats_emitted(), 2);
//! assert_eq!(engine.voice_sync_accuracy(), 0);
//! # Ok::<(), neurobeat::Error>(())
//! ```
//!
//! ## Subsystems
//!
//! - [`core`]: transport clock, scheduler thread, session modes, audio output
//! - [`synth`]: timbre bank and voice rendering
//! - [`analysis`]: voice monitor, rhythm history, sync scorer, microphone capture
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `cpal` (default) | Audio output and microphone capture through CPAL |
//!
//! With `default-features = false` only the headless backend opens, and voice
//! detection needs an injected [`WaveformSource`].

pub mod error;
pub use error::{Error, Result};

pub use neurobeat_analysis as analysis;
pub use neurobeat_core as core;
pub use neurobeat_synth as synth;

pub use neurobeat_analysis::{score, SyncScore, VoiceMonitor, WaveformSource};
pub use neurobeat_core::{
    AudioBackend, BeatEvent, BeatObserver, ClockSource, EngineConfig, ManualClock, SessionMode,
    SystemClock, TempoAdvisor, TempoRange, TempoSuggestion, Timbre,
};
pub use neurobeat_synth::{Patch, TimbreBank};

mod builder;
mod engine;
mod summary;

pub use builder::{BeatEngineBuilder, SourceOpener, TickDrive, VoiceInput};
pub use engine::{BeatEngine, EngineState};
pub use summary::SessionSummary;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{BeatEngine, BeatEngineBuilder, EngineState, SessionSummary, VoiceInput};

    pub use crate::core::{
        AudioBackend, BeatEvent, BeatObserver, ClockSource, EngineConfig, ManualClock,
        SessionMode, SystemClock, Timbre,
    };

    pub use crate::analysis::WaveformSource;
}
