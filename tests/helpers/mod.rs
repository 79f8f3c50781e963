//! Test helpers and fixtures for neurobeat integration tests
//!
//! Every fixture runs headless on a [`ManualClock`] with manual drive, so
//! beats fire only when a test advances the clock and calls `pump`.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-9): exact clock arithmetic
//! - `SILENCE_THRESHOLD` (0.0001): silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use neurobeat::analysis::Error as AnalysisError;
use neurobeat::core::AtomicFloat;
use neurobeat::prelude::*;
use std::sync::Arc;

/// Sample rate for headless rendering.
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Samples per voice poll.
pub const TEST_WAVEFORM_SIZE: usize = 512;

/// Peak amplitude of a "spoken" block; RMS ≈ 0.21, well above threshold.
pub const VOICE_LEVEL: f32 = 0.3;

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn base_builder(clock: &Arc<ManualClock>) -> BeatEngineBuilder {
    BeatEngine::builder()
        .headless()
        .sample_rate(TEST_SAMPLE_RATE)
        .waveform_size(TEST_WAVEFORM_SIZE)
        .clock(clock.clone())
        .manual_drive()
}

/// Engine without voice input.
pub fn test_engine() -> (Arc<ManualClock>, BeatEngine) {
    init_tracing();
    let clock = Arc::new(ManualClock::new());
    let engine = base_builder(&clock)
        .no_microphone()
        .build()
        .expect("Failed to create test engine");
    (clock, engine)
}

/// Engine whose microphone is a [`FakeVoice`].
pub fn voice_engine() -> (Arc<ManualClock>, BeatEngine, FakeVoice) {
    init_tracing();
    let clock = Arc::new(ManualClock::new());
    let voice = FakeVoice::new();
    let engine = base_builder(&clock)
        .waveform_source(voice.source())
        .build()
        .expect("Failed to create voice test engine");
    (clock, engine, voice)
}

/// Engine whose microphone request is refused.
pub fn denied_microphone_engine() -> (Arc<ManualClock>, BeatEngine) {
    init_tracing();
    let clock = Arc::new(ManualClock::new());
    let engine = base_builder(&clock)
        .voice_input(VoiceInput::Opener(Box::new(|| {
            Err(AnalysisError::PermissionDenied(
                "user dismissed the prompt".into(),
            ))
        })))
        .build()
        .expect("Failed to create test engine");
    (clock, engine)
}

/// A microphone stand-in: a 220 Hz sine whose amplitude the test controls.
#[derive(Clone)]
pub struct FakeVoice {
    level: Arc<AtomicFloat>,
}

impl FakeVoice {
    pub fn new() -> Self {
        Self {
            level: Arc::new(AtomicFloat::new(0.0)),
        }
    }

    pub fn set_level(&self, level: f32) {
        self.level.set(level);
    }

    pub fn source(&self) -> impl WaveformSource + 'static {
        let level = Arc::clone(&self.level);
        let sine = generate_sine(220.0, TEST_SAMPLE_RATE, TEST_WAVEFORM_SIZE);
        move |out: &mut [f32]| {
            let gain = level.get();
            for (o, s) in out.iter_mut().zip(sine.iter().cycle()) {
                *o = s * gain;
            }
            out.len()
        }
    }
}

/// Step the clock from beat to beat up to `until`, pumping at each one the
/// way a punctual scheduler thread would.
pub fn run_until(clock: &ManualClock, engine: &BeatEngine, until: f64) {
    while let Some(next) = engine.pump() {
        if next > until {
            break;
        }
        clock.set(next);
    }
    clock.set(until);
    engine.pump();
}

/// Vocalize at each time in `onsets`, one poll per onset, silent in between.
pub fn speak_at(clock: &ManualClock, engine: &BeatEngine, voice: &FakeVoice, onsets: &[f64]) {
    for &t in onsets {
        clock.set(t);
        voice.set_level(VOICE_LEVEL);
        engine.pump();
        voice.set_level(0.0);
    }
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}

/// Check if signal is effectively silent.
pub fn is_silent(samples: &[f32]) -> bool {
    peak(samples) < tolerances::SILENCE_THRESHOLD
}
