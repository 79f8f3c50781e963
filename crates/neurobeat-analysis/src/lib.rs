//! Voice analysis for neurobeat.
//!
//! - **[`VoiceMonitor`]**: RMS onset detection, rhythm history, live accuracy
//! - **[`score`]**: beat synchronization score over recent onsets
//! - **[`WaveformSource`]** / **[`RingWaveform`]**: sources of the newest samples
//! - **[`MicrophoneCapture`]**: CPAL input feeding a ring (feature `cpal`)
//! - **[`VoicePoller`]**: polling thread
//!
//! All analysis functions operate on raw `&[f32]` buffers.
//!
//! ## Example
//!
//! ```rust
//! use neurobeat_analysis::{VoiceMonitor, VoiceMonitorConfig};
//! use neurobeat_core::ManualClock;
//! use std::sync::{atomic::AtomicU32, Arc};
//!
//! let clock = Arc::new(ManualClock::new());
//! let monitor = VoiceMonitor::new(VoiceMonitorConfig::default(), clock.clone(), Arc::new(AtomicU32::new(60)));
//!
//! for beat in 0..5 {
//!     clock.set(beat as f64);
//!     monitor.process_waveform(&[0.2; 1024]);
//! }
//! assert_eq!(monitor.voice_sync_accuracy(), 100);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod history;
pub mod scorer;

mod capture;
mod monitor;
mod poller;
mod rms;
mod source;

pub use capture::MicrophoneCapture;
pub use history::RhythmHistory;
pub use monitor::{VoiceMonitor, VoiceMonitorConfig};
pub use poller::{VoicePoller, VoiceSampler};
pub use rms::rms;
pub use scorer::{round_accuracy, score, SyncScore};
pub use source::{waveform_ring, RingWaveform, WaveformSource};
