//! Builder for configuring and constructing a `BeatEngine`.

use crate::{BeatEngine, Result};
use neurobeat_analysis::{VoiceMonitor, VoiceMonitorConfig, WaveformSource};
use neurobeat_core::{
    AudioBackend, ClockSource, EngineConfig, SessionMode, SystemClock, Timbre, TransportClock,
};
use std::fmt;
use std::sync::Arc;

/// Opens a waveform source when the engine initializes.
pub type SourceOpener =
    Box<dyn FnMut() -> neurobeat_analysis::Result<Box<dyn WaveformSource>> + Send>;

/// Where voice samples come from.
///
/// Every variant except `Disabled` may fail at `initialize()`; the engine then
/// keeps running with voice detection off.
#[derive(Default)]
pub enum VoiceInput {
    /// Host default microphone.
    #[default]
    Default,
    /// Microphone by input device index.
    Device(usize),
    /// No voice detection.
    Disabled,
    /// An already open source.
    Source(Box<dyn WaveformSource>),
    /// A source opened lazily during `initialize()`.
    Opener(SourceOpener),
}

impl fmt::Debug for VoiceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceInput::Default => f.write_str("Default"),
            VoiceInput::Device(index) => f.debug_tuple("Device").field(index).finish(),
            VoiceInput::Disabled => f.write_str("Disabled"),
            VoiceInput::Source(_) => f.write_str("Source(..)"),
            VoiceInput::Opener(_) => f.write_str("Opener(..)"),
        }
    }
}

/// Who calls the transport's tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickDrive {
    /// Scheduler and voice poller threads.
    #[default]
    Thread,
    /// The host calls [`BeatEngine::pump`]. No threads are spawned.
    Manual,
}

/// Configures a [`BeatEngine`]. Nothing is opened until
/// [`BeatEngine::initialize`] runs.
///
/// # Example
///
/// ```
/// use neurobeat::prelude::*;
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::new());
/// let engine = BeatEngine::builder()
///     .headless()
///     .no_microphone()
///     .session_mode(SessionMode::SpeechRhythm)
///     .clock(clock.clone())
///     .manual_drive()
///     .build()?;
///
/// assert!(engine.initialize());
/// assert!(engine.start(60));
/// assert_eq!(engine.tempo(), 80);
/// # Ok::<(), neurobeat::Error>(())
/// ```
pub struct BeatEngineBuilder {
    config: EngineConfig,
    backend: AudioBackend,
    voice_input: VoiceInput,
    clock: Option<Arc<dyn ClockSource>>,
    drive: TickDrive,
}

impl Default for BeatEngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            backend: AudioBackend::Cpal { device_index: None },
            voice_input: VoiceInput::Default,
            clock: None,
            drive: TickDrive::Thread,
        }
    }
}

impl BeatEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Headless render rate. Device outputs use the device rate.
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 60
    pub fn initial_bpm(mut self, bpm: u32) -> Self {
        self.config.initial_bpm = bpm;
        self
    }

    pub fn session_mode(mut self, mode: SessionMode) -> Self {
        self.config.session_mode = mode;
        self
    }

    pub fn timbre(mut self, timbre: Timbre) -> Self {
        self.config.timbre = timbre;
        self
    }

    /// Default: 0.01
    pub fn voice_threshold(mut self, threshold: f32) -> Self {
        self.config.voice_threshold = threshold;
        self
    }

    pub fn waveform_size(mut self, samples: usize) -> Self {
        self.config.waveform_size = samples;
        self
    }

    /// Default: 16
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn metronome_volume(mut self, gain: f32) -> Self {
        self.config.metronome_volume = gain;
        self
    }

    pub fn audio_backend(mut self, backend: AudioBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Render without an audio device.
    pub fn headless(self) -> Self {
        self.audio_backend(AudioBackend::Headless)
    }

    pub fn output_device(self, index: usize) -> Self {
        self.audio_backend(AudioBackend::Cpal {
            device_index: Some(index),
        })
    }

    pub fn voice_input(mut self, input: VoiceInput) -> Self {
        self.voice_input = input;
        self
    }

    pub fn input_device(self, index: usize) -> Self {
        self.voice_input(VoiceInput::Device(index))
    }

    pub fn no_microphone(self) -> Self {
        self.voice_input(VoiceInput::Disabled)
    }

    pub fn waveform_source(self, source: impl WaveformSource + 'static) -> Self {
        self.voice_input(VoiceInput::Source(Box::new(source)))
    }

    /// Default: [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Tick only when [`BeatEngine::pump`] is called.
    pub fn manual_drive(mut self) -> Self {
        self.drive = TickDrive::Manual;
        self
    }

    pub fn build(self) -> Result<BeatEngine> {
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()) as Arc<dyn ClockSource>);

        let transport = Arc::new(TransportClock::new(
            Arc::clone(&clock),
            self.config.initial_bpm,
            self.config.session_mode,
            self.config.timbre,
        ));
        let monitor = Arc::new(VoiceMonitor::new(
            VoiceMonitorConfig::from(&self.config),
            clock,
            Arc::clone(transport.tempo_shared()),
        ));

        Ok(BeatEngine::from_parts(
            self.config,
            self.backend,
            self.drive,
            transport,
            monitor,
            self.voice_input,
        ))
    }
}
