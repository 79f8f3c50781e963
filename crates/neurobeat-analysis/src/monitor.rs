//! Voice monitor: onset detection, rhythm history and live sync accuracy.
//!
//! Each poll hands the monitor a waveform block. Its RMS becomes the current
//! volume; a level above the threshold is a voice onset, stamped with the
//! engine clock. History append, trim and rescoring happen in one critical
//! section so concurrent readers never see a half-updated history.
//!
//! Accessors are lock-free and return neutral values (0 / false) until the
//! first onset, which is also what a monitor without a microphone reports.

use crate::history::RhythmHistory;
use crate::rms::rms;
use crate::scorer::{round_accuracy, score};
use neurobeat_core::{AtomicDouble, AtomicFlag, AtomicFloat, ClockSource, EngineConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceMonitorConfig {
    /// RMS level above which a block counts as an onset.
    pub threshold: f32,
    pub history_window: f64,
    pub activity_window: f64,
}

impl Default for VoiceMonitorConfig {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for VoiceMonitorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            threshold: config.voice_threshold,
            history_window: config.history_window_secs,
            activity_window: config.activity_window_secs,
        }
    }
}

pub struct VoiceMonitor {
    config: VoiceMonitorConfig,
    clock: Arc<dyn ClockSource>,
    tempo: Arc<AtomicU32>,
    history: Mutex<RhythmHistory>,
    volume: AtomicFloat,
    last_voice_time: AtomicDouble,
    accuracy: AtomicDouble,
    enabled: AtomicFlag,
}

impl VoiceMonitor {
    /// `tempo` is the live BPM cell shared with the transport.
    pub fn new(config: VoiceMonitorConfig, clock: Arc<dyn ClockSource>, tempo: Arc<AtomicU32>) -> Self {
        Self {
            config,
            clock,
            tempo,
            history: Mutex::new(RhythmHistory::new(config.history_window)),
            volume: AtomicFloat::new(0.0),
            last_voice_time: AtomicDouble::new(f64::NEG_INFINITY),
            accuracy: AtomicDouble::new(0.0),
            enabled: AtomicFlag::new(false),
        }
    }

    pub fn config(&self) -> &VoiceMonitorConfig {
        &self.config
    }

    /// Whether a microphone source is attached and being polled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Analyze one waveform block. Returns `true` if it was an onset.
    pub fn process_waveform(&self, waveform: &[f32]) -> bool {
        self.process_volume(rms(waveform))
    }

    /// Record a precomputed RMS level. Returns `true` if it was an onset.
    pub fn process_volume(&self, volume: f32) -> bool {
        self.volume.set(volume);
        if volume <= self.config.threshold {
            return false;
        }

        let now = self.clock.now();
        self.last_voice_time.set(now);

        let mut history = self.history.lock();
        let appended = history.push(now);
        history.trim(now);
        if let Some(result) = score(history.as_slice(), self.tempo.load(Ordering::Acquire)) {
            self.accuracy.set(result.accuracy);
        }
        drop(history);

        trace!(time = now, volume, appended, "voice onset");
        true
    }

    /// Latest RMS level, regardless of threshold.
    pub fn voice_volume(&self) -> f32 {
        self.volume.get()
    }

    /// True while the last onset is within the activity window.
    pub fn is_voice_active(&self) -> bool {
        self.clock.now() - self.last_voice_time.get() < self.config.activity_window
    }

    /// Sync accuracy rounded to `0..=100`.
    pub fn voice_sync_accuracy(&self) -> u8 {
        round_accuracy(self.accuracy.get())
    }

    /// Unrounded sync accuracy.
    pub fn accuracy(&self) -> f64 {
        self.accuracy.get()
    }

    pub fn last_voice_time(&self) -> Option<f64> {
        let t = self.last_voice_time.get();
        t.is_finite().then_some(t)
    }

    /// Copy of the current rhythm history, oldest first.
    pub fn history(&self) -> Vec<f64> {
        self.history.lock().as_slice().to_vec()
    }

    /// Return to the neutral state.
    pub fn reset(&self) {
        self.history.lock().clear();
        self.volume.set(0.0);
        self.last_voice_time.set(f64::NEG_INFINITY);
        self.accuracy.set(0.0);
    }
}
