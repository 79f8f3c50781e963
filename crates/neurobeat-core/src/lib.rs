//! Core runtime for the neurobeat engine: transport clock, session modes and
//! tempo bounds, timbre names, audio output, and lock-free primitives.
//!
//! # Primary API
//!
//! - [`TransportClock`] / [`Scheduler`]: beat scheduling against a [`ClockSource`]
//! - [`BeatObserver`] / [`BeatTrigger`]: per-beat seams for visuals and audio
//! - [`AudioOutput`]: CPAL device stream or headless sink
//! - [`EngineConfig`]: serde-backed configuration
//!
//! # Feature flags
//!
//! - `"cpal"` (default): hardware output devices. With `default-features = false`
//!   only [`AudioBackend::Headless`] opens.
//!
//! # Example
//!
//! ```
//! use neurobeat_core::{ManualClock, SessionMode, Timbre, TransportClock};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new());
//! let transport = TransportClock::new(clock.clone(), 120, SessionMode::GaitTrainer, Timbre::Drum);
//!
//! transport.start();
//! for t in [0.0, 0.5, 1.0] {
//!     clock.set(t);
//!     transport.poll();
//! }
//! assert_eq!(transport.beats_emitted(), 3);
//! ```

pub mod error;
pub use error::{Error, Result};

pub(crate) mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicFloat};

mod timebase;
pub use timebase::{ClockSource, ManualClock, SystemClock};

mod session;
pub use session::{SessionMode, TempoRange};

mod timbre;
pub use timbre::Timbre;

mod config;
pub use config::EngineConfig;

pub mod transport;
pub use transport::{
    beat_interval, BeatEvent, BeatObserver, BeatTrigger, MotionState, Scheduler, TransportClock,
};

mod adaptation;
pub use adaptation::{TempoAdvisor, TempoSuggestion};

mod output;
pub use output::{AudioBackend, AudioOutput, AudioRenderer};
