//! BeatEngine that coordinates the transport, timbre bank and voice monitor

use crate::builder::{TickDrive, VoiceInput};
use crate::summary::{SessionSummary, SessionTracker};
use crate::Result;
use neurobeat_analysis::{
    MicrophoneCapture, VoiceMonitor, VoicePoller, VoiceSampler, WaveformSource,
};
use neurobeat_core::{
    AtomicFloat, AudioBackend, AudioOutput, BeatObserver, EngineConfig, Scheduler, SessionMode,
    Timbre, TempoAdvisor, TempoSuggestion, TransportClock,
};
use neurobeat_synth::TimbreBank;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Engine lifecycle.
///
/// `Uninitialized → Initializing → Ready → Playing ⇄ Paused → Stopped`, with
/// `Disposed` reachable from anywhere and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    Playing,
    Paused,
    Stopped,
    Disposed,
}

/// Everything `initialize()` opens and `dispose()` releases.
#[derive(Default)]
struct Resources {
    voice_input: Option<VoiceInput>,
    output: Option<AudioOutput>,
    bank: Option<TimbreBank>,
    scheduler: Option<Scheduler>,
    poller: Option<VoicePoller>,
    /// Manual drive polls the voice source from `pump`.
    sampler: Option<VoiceSampler>,
    capture: Option<MicrophoneCapture>,
}

/// Beat scheduling and voice synchronization engine.
///
/// Construct with [`BeatEngine::builder`], then [`initialize`](Self::initialize).
/// Control methods never return errors: invalid input is normalized, calls
/// in the wrong state return `false`, and a missing microphone only disables
/// the voice accessors (they report `0` / `false`).
///
/// Locks are taken in the order state → session/resources, and none is held
/// while the transport ticks or while background threads are joined, so a
/// beat callback may call back into the engine.
///
/// # Example
///
/// ```
/// use neurobeat::prelude::*;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::new());
/// let engine = BeatEngine::builder()
///     .headless()
///     .no_microphone()
///     .clock(clock.clone())
///     .manual_drive()
///     .build()?;
///
/// let pulses = Arc::new(AtomicU64::new(0));
/// let counter = Arc::clone(&pulses);
/// engine.set_beat_callback(move |_: &BeatEvent| {
///     counter.fetch_add(1, Ordering::Relaxed);
/// });
///
/// assert!(engine.initialize());
/// assert!(engine.start(120));
/// for beat in 0..5 {
///     clock.set(beat as f64 * 0.5);
///     engine.pump();
/// }
/// assert_eq!(pulses.load(Ordering::Relaxed), 5);
///
/// engine.dispose();
/// # Ok::<(), neurobeat::Error>(())
/// ```
pub struct BeatEngine {
    config: EngineConfig,
    backend: AudioBackend,
    drive: TickDrive,
    transport: Arc<TransportClock>,
    monitor: Arc<VoiceMonitor>,
    advisor: TempoAdvisor,
    volume: AtomicFloat,
    state: Mutex<EngineState>,
    session: Mutex<SessionTracker>,
    resources: Mutex<Resources>,
}

impl BeatEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::BeatEngineBuilder {
        crate::BeatEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        backend: AudioBackend,
        drive: TickDrive,
        transport: Arc<TransportClock>,
        monitor: Arc<VoiceMonitor>,
        voice_input: VoiceInput,
    ) -> Self {
        let volume = AtomicFloat::new(config.metronome_volume);
        Self {
            config,
            backend,
            drive,
            transport,
            monitor,
            advisor: TempoAdvisor::default(),
            volume,
            state: Mutex::new(EngineState::Uninitialized),
            session: Mutex::new(SessionTracker::default()),
            resources: Mutex::new(Resources {
                voice_input: Some(voice_input),
                ..Default::default()
            }),
        }
    }

    // ---- lifecycle -------------------------------------------------------

    /// Allocate audio and attach voice detection.
    ///
    /// Returns `false` only when the audio output or synthesizer cannot be
    /// brought up; the engine is then left `Uninitialized` with nothing
    /// running. A missing or refused microphone is logged and the engine
    /// still becomes `Ready`. Calling again once ready is a no-op.
    pub fn initialize(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            EngineState::Uninitialized => {}
            EngineState::Disposed => {
                warn!("initialize called on a disposed engine");
                return false;
            }
            _ => return true,
        }
        *state = EngineState::Initializing;

        let mut resources = self.resources.lock();
        if let Err(e) = self.start_audio(&mut resources) {
            error!(error = %e, backend = ?self.backend, "audio initialization failed");
            self.release_audio(&mut resources);
            *state = EngineState::Uninitialized;
            return false;
        }
        self.attach_voice(&mut resources);
        drop(resources);

        *state = EngineState::Ready;
        info!(
            bpm = self.transport.tempo(),
            mode = self.transport.session_mode().as_str(),
            voice = self.monitor.is_enabled(),
            "engine ready"
        );
        true
    }

    fn start_audio(&self, resources: &mut Resources) -> Result<()> {
        let mut output = AudioOutput::open(self.backend, self.config.sample_rate)?;
        let (bank, renderer) = TimbreBank::new(output.sample_rate(), self.transport.timbre())?;
        bank.set_volume(self.volume.get());
        output.start(Box::new(renderer))?;

        self.transport.set_trigger(Box::new(bank.clone()));
        resources.output = Some(output);
        resources.bank = Some(bank);

        if self.drive == TickDrive::Thread {
            resources.scheduler = Some(Scheduler::spawn(Arc::clone(&self.transport))?);
        }
        Ok(())
    }

    fn release_audio(&self, resources: &mut Resources) {
        self.transport.clear_trigger();
        if let Some(mut scheduler) = resources.scheduler.take() {
            scheduler.shutdown();
        }
        if let Some(bank) = resources.bank.take() {
            release_voices(&bank);
        }
        if let Some(mut output) = resources.output.take() {
            output.stop();
        }
    }

    fn attach_voice(&self, resources: &mut Resources) {
        let input = resources.voice_input.take().unwrap_or(VoiceInput::Disabled);
        let waveform_size = self.config.waveform_size;

        let opened: neurobeat_analysis::Result<Box<dyn WaveformSource>> = match input {
            VoiceInput::Disabled => {
                info!("voice detection disabled");
                return;
            }
            VoiceInput::Default => open_microphone(resources, None, waveform_size),
            VoiceInput::Device(index) => open_microphone(resources, Some(index), waveform_size),
            VoiceInput::Source(source) => Ok(source),
            VoiceInput::Opener(mut open) => open(),
        };

        let source = match opened {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "microphone unavailable, continuing without voice detection");
                return;
            }
        };

        let sampler = VoiceSampler::new(source, waveform_size);
        match self.drive {
            TickDrive::Manual => resources.sampler = Some(sampler),
            TickDrive::Thread => {
                let interval = Duration::from_millis(self.config.poll_interval_ms);
                match VoicePoller::spawn(Arc::clone(&self.monitor), sampler, interval) {
                    Ok(poller) => resources.poller = Some(poller),
                    Err(e) => {
                        warn!(error = %e, "voice polling failed to start, continuing without voice detection");
                        resources.capture = None;
                        return;
                    }
                }
            }
        }

        self.monitor.set_enabled(true);
        info!("voice detection enabled");
    }

    /// Start (or restart) ticking at `bpm`, clamped to the session range.
    ///
    /// From `Paused` this continues the paused session at the new tempo.
    /// While already playing it only changes the tempo.
    pub fn start(&self, bpm: i32) -> bool {
        let mut state = self.state.lock();
        let resuming = match *state {
            EngineState::Ready | EngineState::Stopped => false,
            EngineState::Paused => true,
            EngineState::Playing => return self.transport.set_tempo(bpm as i64),
            other => {
                warn!(state = ?other, "start ignored");
                return false;
            }
        };

        if !self.transport.start_with_tempo(bpm as i64) {
            return false;
        }

        let now = self.transport.now();
        let mut session = self.session.lock();
        if resuming {
            session.resume(now);
        } else {
            session.begin(self.transport.tempo(), now);
        }
        *state = EngineState::Playing;
        true
    }

    /// Halt ticking and silence ringing voices. The next `start` begins a new session.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, EngineState::Playing | EngineState::Paused) {
            return false;
        }

        self.transport.stop();
        if let Some(bank) = &self.resources.lock().bank {
            release_voices(bank);
        }
        self.session.lock().finish(self.transport.now());
        *state = EngineState::Stopped;
        true
    }

    pub fn pause(&self) -> bool {
        let mut state = self.state.lock();
        if *state != EngineState::Playing || !self.transport.pause() {
            return false;
        }
        self.session.lock().suspend(self.transport.now());
        *state = EngineState::Paused;
        true
    }

    /// Continue from pause with the tempo and beat phase unchanged.
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        if *state != EngineState::Paused || !self.transport.resume() {
            return false;
        }
        self.session.lock().resume(self.transport.now());
        *state = EngineState::Playing;
        true
    }

    /// Stop ticking, halt voice polling and release every device. Idempotent.
    ///
    /// Resources are released before this returns. No other operation has
    /// an effect afterwards.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if *state == EngineState::Disposed {
            return;
        }
        let was_running = matches!(*state, EngineState::Playing | EngineState::Paused);

        self.transport.stop();
        self.transport.clear_observer();
        if was_running {
            self.session.lock().finish(self.transport.now());
        }
        let mut resources = std::mem::take(&mut *self.resources.lock());
        *state = EngineState::Disposed;
        drop(state);

        // Threads are joined with no engine lock held
        self.release_audio(&mut resources);
        if let Some(mut poller) = resources.poller.take() {
            poller.stop();
        }
        resources.sampler = None;
        resources.capture = None;
        self.monitor.set_enabled(false);

        info!("engine disposed");
    }

    // ---- control ---------------------------------------------------------

    /// Change tempo, clamped to the session range. Ignored (returns `false`)
    /// unless a session is running or paused.
    pub fn set_tempo(&self, bpm: i32) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.transport.set_tempo(bpm as i64)
    }

    /// Switch therapy mode; the current tempo is pulled into the new range.
    pub fn set_session_type(&self, mode: SessionMode) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.transport.set_session_mode(mode);
        true
    }

    /// Unknown names select [`SessionMode::GaitTrainer`].
    pub fn set_session_type_name(&self, name: &str) -> bool {
        self.set_session_type(SessionMode::from_name(name))
    }

    /// Change the beat sound from the next tick on, without stopping.
    pub fn set_sound_type(&self, timbre: Timbre) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.transport.set_timbre(timbre);
        if let Some(bank) = &self.resources.lock().bank {
            bank.select(timbre);
        }
        true
    }

    /// Unknown names select [`Timbre::Metronome`].
    pub fn set_sound_type_name(&self, name: &str) -> bool {
        self.set_sound_type(Timbre::from_name(name))
    }

    /// Register the visual beat hook, replacing any previous one.
    ///
    /// Called once per beat, after the audio trigger and with the same
    /// [`BeatEvent::time`](neurobeat_core::BeatEvent::time).
    pub fn set_beat_callback(&self, observer: impl BeatObserver + 'static) {
        if self.is_disposed() {
            return;
        }
        self.transport.set_observer(Box::new(observer));
    }

    pub fn clear_beat_callback(&self) {
        self.transport.clear_observer();
    }

    /// Metronome gain (linear, perceptual). Other timbres are unaffected.
    pub fn set_volume(&self, gain: f32) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.volume.set(gain);
        if let Some(bank) = &self.resources.lock().bank {
            let db = bank.set_volume(gain);
            debug!(gain, db, "metronome volume set");
        }
        true
    }

    // ---- driving ---------------------------------------------------------

    /// Poll the voice source (manual drive) and fire any due beats.
    ///
    /// Returns the time of the next beat, or `None` when not playing.
    /// With threaded drive the threads do this and `pump` is not needed.
    pub fn pump(&self) -> Option<f64> {
        if self.is_disposed() {
            return None;
        }
        if let Some(sampler) = self.resources.lock().sampler.as_mut() {
            sampler.poll(&self.monitor);
        }
        self.transport.poll()
    }

    /// Pull `frames` stereo frames from a headless output.
    pub fn render_offline(&self, frames: usize) -> Option<Vec<f32>> {
        self.resources.lock().output.as_mut()?.render_offline(frames)
    }

    // ---- queries ---------------------------------------------------------

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == EngineState::Playing
    }

    fn is_disposed(&self) -> bool {
        self.state() == EngineState::Disposed
    }

    pub fn tempo(&self) -> u32 {
        self.transport.tempo()
    }

    pub fn session_mode(&self) -> SessionMode {
        self.transport.session_mode()
    }

    pub fn sound_type(&self) -> Timbre {
        self.transport.timbre()
    }

    pub fn beats_emitted(&self) -> u64 {
        self.transport.beats_emitted()
    }

    /// Rounded sync accuracy `0..=100`; `0` until voice onsets have been scored.
    pub fn voice_sync_accuracy(&self) -> u8 {
        self.monitor.voice_sync_accuracy()
    }

    /// Whether a voice onset was seen within the last second.
    pub fn is_voice_active(&self) -> bool {
        self.monitor.is_voice_active()
    }

    /// Most recent RMS level, regardless of threshold.
    pub fn voice_volume(&self) -> f32 {
        self.monitor.voice_volume()
    }

    /// Whether a voice source is attached.
    pub fn is_voice_enabled(&self) -> bool {
        self.monitor.is_enabled()
    }

    /// Engine-clock timestamps of recent voice onsets, oldest first.
    pub fn voice_history(&self) -> Vec<f64> {
        self.monitor.history()
    }

    /// Next tempo to try given the current accuracy. Never applied automatically.
    pub fn suggested_tempo(&self) -> TempoSuggestion {
        self.advisor.suggest(self.tempo(), self.monitor.accuracy())
    }

    /// Summary of the running session, or of the last one after `stop`.
    pub fn session_summary(&self) -> SessionSummary {
        let session = self.session.lock();
        let final_bpm = self.transport.tempo();
        SessionSummary {
            session_mode: self.transport.session_mode(),
            timbre: self.transport.timbre(),
            initial_bpm: session.initial_bpm().unwrap_or(final_bpm),
            final_bpm,
            duration_secs: session.duration(self.transport.now()),
            beats_emitted: self.transport.beats_emitted(),
            accuracy_score: self.monitor.voice_sync_accuracy(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Output sample rate, once initialized.
    pub fn sample_rate(&self) -> Option<f64> {
        self.resources.lock().output.as_ref().map(AudioOutput::sample_rate)
    }

    /// List available output devices
    pub fn list_output_devices() -> Result<Vec<String>> {
        Ok(AudioOutput::list_devices()?)
    }

    /// List available microphones
    pub fn list_input_devices() -> Result<Vec<String>> {
        Ok(MicrophoneCapture::list_devices()?)
    }
}

impl Drop for BeatEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn open_microphone(
    resources: &mut Resources,
    device_index: Option<usize>,
    waveform_size: usize,
) -> neurobeat_analysis::Result<Box<dyn WaveformSource>> {
    let (capture, waveform) = MicrophoneCapture::open(device_index, waveform_size)?;
    info!(device = capture.device_name(), "microphone attached");
    resources.capture = Some(capture);
    Ok(Box::new(waveform))
}

fn release_voices(bank: &TimbreBank) {
    if let Err(e) = bank.release_all() {
        warn!(error = %e, "ringing voices not released");
    }
}
