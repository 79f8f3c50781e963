//! Timbre bank: control handle plus audio-thread renderer.
//!
//! [`TimbreBank`] lives on the control side (and is the transport's
//! [`BeatTrigger`]); it sends [`VoiceCommand`]s over a bounded queue to the
//! [`BankRenderer`], which owns every voice and runs on the audio thread.
//!
//! `Metronome` and `SoftBeat` share one instrument slot. Selecting the other
//! variant silences that slot's voices and swaps in a fresh instrument built
//! for the new patch; both are built up front so the swap never allocates.
//! The remaining timbres are separate instruments that can ring together.

use crate::error::{Error, Result};
use crate::patch::Patch;
use crate::voice::Voice;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use neurobeat_core::{AtomicFlag, AtomicFloat, AudioRenderer, BeatEvent, BeatTrigger, Timbre};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Voices per instrument. The oldest is stolen when all are busy.
pub const VOICES_PER_INSTRUMENT: usize = 8;

const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Floor for the gain-to-decibel conversion.
const MIN_GAIN: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
    /// Start a note on `timbre`'s instrument, gated for `duration` seconds.
    Trigger { timbre: Timbre, duration: f32 },
    /// Reload the metronome slot with another variant.
    Reallocate(Timbre),
    /// Metronome voice level in dB.
    SetMetronomeGain(f32),
    ReleaseAll,
}

/// Perceptual gain to decibels, floored so silence maps to -60 dB.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(MIN_GAIN).log10()
}

#[inline]
pub fn db_to_amplitude(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

struct BankShared {
    active: AtomicU8,
    metronome_variant: AtomicU8,
    volume_db: AtomicFloat,
    allocations: AtomicU64,
    /// Release requested while the command queue was full.
    release_pending: AtomicFlag,
}

/// Control handle. Cheap to clone.
#[derive(Clone)]
pub struct TimbreBank {
    commands: Sender<VoiceCommand>,
    shared: Arc<BankShared>,
}

impl TimbreBank {
    /// Create a bank and the renderer that plays it at `sample_rate`.
    pub fn new(sample_rate: f64, initial: Timbre) -> Result<(TimbreBank, BankRenderer)> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }

        let variant = if initial.is_metronome_variant() {
            initial
        } else {
            Timbre::Metronome
        };
        let shared = Arc::new(BankShared {
            active: AtomicU8::new(initial.into()),
            metronome_variant: AtomicU8::new(variant.into()),
            volume_db: AtomicFloat::new(0.0),
            allocations: AtomicU64::new(1),
            release_pending: AtomicFlag::new(false),
        });
        let (commands, receiver) = bounded(COMMAND_QUEUE_CAPACITY);

        let renderer = BankRenderer::new(receiver, Arc::clone(&shared), sample_rate as f32, variant);
        debug!(sample_rate, timbre = initial.as_str(), "timbre bank created");
        Ok((TimbreBank { commands, shared }, renderer))
    }

    pub fn active(&self) -> Timbre {
        Timbre::from(self.shared.active.load(Ordering::Acquire))
    }

    /// Variant currently loaded in the metronome slot.
    pub fn metronome_variant(&self) -> Timbre {
        Timbre::from(self.shared.metronome_variant.load(Ordering::Acquire))
    }

    /// Number of times the metronome slot has been (re)allocated by the renderer.
    pub fn metronome_allocations(&self) -> u64 {
        self.shared.allocations.load(Ordering::Acquire)
    }

    /// Make `timbre` the active sound, reallocating the metronome slot when
    /// switching between its variants.
    pub fn select(&self, timbre: Timbre) {
        self.shared.active.store(timbre.into(), Ordering::Release);

        if timbre.is_metronome_variant() {
            let previous = self
                .shared
                .metronome_variant
                .swap(timbre.into(), Ordering::AcqRel);
            if Timbre::from(previous) != timbre {
                debug!(
                    from = Timbre::from(previous).as_str(),
                    to = timbre.as_str(),
                    "reallocating metronome voice"
                );
                if let Err(e) = self.send(VoiceCommand::Reallocate(timbre)) {
                    warn!(error = %e, "metronome reallocation not queued");
                }
            }
        }
    }

    /// Set the metronome level from a linear gain. Returns the applied dB.
    pub fn set_volume(&self, gain: f32) -> f32 {
        let db = gain_to_db(gain);
        self.shared.volume_db.set(db);
        if let Err(e) = self.send(VoiceCommand::SetMetronomeGain(db)) {
            warn!(error = %e, "volume change not queued");
        }
        db
    }

    pub fn volume_db(&self) -> f32 {
        self.shared.volume_db.get()
    }

    /// Queue a note on `timbre` held for `duration` seconds.
    pub fn trigger_note(&self, timbre: Timbre, duration: f32) -> Result<()> {
        self.send(VoiceCommand::Trigger { timbre, duration })
    }

    /// Release every sounding voice. With the queue full the release is
    /// flagged instead and applied at the start of the next audio block.
    pub fn release_all(&self) -> Result<()> {
        match self.send(VoiceCommand::ReleaseAll) {
            Err(Error::QueueFull) => {
                self.shared.release_pending.set(true);
                warn!("command queue full, release deferred to the next block");
                Ok(())
            }
            result => result,
        }
    }

    fn send(&self, command: VoiceCommand) -> Result<()> {
        self.commands.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull,
            TrySendError::Disconnected(_) => Error::Disconnected,
        })
    }
}

impl BeatTrigger for TimbreBank {
    fn trigger(&self, event: &BeatEvent) {
        self.select(event.timbre);
        let duration = Patch::for_timbre(event.timbre).length.seconds(event.bpm);
        match self.trigger_note(event.timbre, duration) {
            Ok(()) => {}
            Err(Error::Disconnected) => {}
            Err(e) => warn!(error = %e, beat = event.index, "beat dropped"),
        }
    }
}

struct Instrument {
    voices: Vec<Voice>,
}

impl Instrument {
    fn new(timbre: Timbre, sample_rate: f32) -> Self {
        let patch = Patch::for_timbre(timbre);
        let voices = (0..VOICES_PER_INSTRUMENT)
            .map(|_| Voice::new(patch, sample_rate))
            .collect();
        Self { voices }
    }

    fn timbre(&self) -> Timbre {
        self.voices[0].patch().timbre
    }

    fn silence(&mut self) {
        for voice in &mut self.voices {
            voice.silence();
        }
    }

    fn note_on(&mut self, duration: f32, order: u64) {
        let index = self
            .voices
            .iter()
            .position(|v| !v.is_active())
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, v)| v.started_at())
                    .map(|(i, _)| i)
            });
        if let Some(index) = index {
            self.voices[index].note_on(duration, order);
        }
    }

    fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        self.voices.iter_mut().map(Voice::next_sample).sum()
    }
}

const METRONOME_SLOT: usize = 0;

fn slot(timbre: Timbre) -> usize {
    match timbre {
        Timbre::Metronome | Timbre::SoftBeat => METRONOME_SLOT,
        Timbre::Drum => 1,
        Timbre::SoftBell => 2,
        Timbre::WoodenBlock => 3,
        Timbre::Piano => 4,
    }
}

/// Audio-thread side of the bank. Renders interleaved stereo.
pub struct BankRenderer {
    commands: Receiver<VoiceCommand>,
    shared: Arc<BankShared>,
    instruments: [Instrument; 5],
    /// The metronome variant not currently in its slot.
    spare_metronome: Instrument,
    metronome_amplitude: f32,
    trigger_count: u64,
}

impl BankRenderer {
    fn new(
        commands: Receiver<VoiceCommand>,
        shared: Arc<BankShared>,
        sample_rate: f32,
        metronome_variant: Timbre,
    ) -> Self {
        let spare = match metronome_variant {
            Timbre::SoftBeat => Timbre::Metronome,
            _ => Timbre::SoftBeat,
        };
        Self {
            commands,
            shared,
            instruments: [
                Instrument::new(metronome_variant, sample_rate),
                Instrument::new(Timbre::Drum, sample_rate),
                Instrument::new(Timbre::SoftBell, sample_rate),
                Instrument::new(Timbre::WoodenBlock, sample_rate),
                Instrument::new(Timbre::Piano, sample_rate),
            ],
            spare_metronome: Instrument::new(spare, sample_rate),
            metronome_amplitude: 1.0,
            trigger_count: 0,
        }
    }

    /// Voices currently sounding for `timbre`'s instrument.
    pub fn active_voices(&self, timbre: Timbre) -> usize {
        self.instruments[slot(timbre)].active_voices()
    }

    /// Variant loaded in the metronome slot, as seen by the audio thread.
    pub fn metronome_variant(&self) -> Timbre {
        self.instruments[METRONOME_SLOT].timbre()
    }

    fn reallocate(&mut self, variant: Timbre) {
        let metronome = &mut self.instruments[METRONOME_SLOT];
        if metronome.timbre() == variant || self.spare_metronome.timbre() != variant {
            return;
        }
        metronome.silence();
        std::mem::swap(metronome, &mut self.spare_metronome);
        self.shared.allocations.fetch_add(1, Ordering::AcqRel);
    }

    fn release_all(&mut self) {
        for instrument in &mut self.instruments {
            instrument.release_all();
        }
    }

    fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Trigger { timbre, duration } => {
                if timbre.is_metronome_variant() {
                    self.reallocate(timbre);
                }
                self.trigger_count += 1;
                let order = self.trigger_count;
                self.instruments[slot(timbre)].note_on(duration, order);
            }
            VoiceCommand::Reallocate(variant) => self.reallocate(variant),
            VoiceCommand::SetMetronomeGain(db) => {
                self.metronome_amplitude = db_to_amplitude(db);
            }
            VoiceCommand::ReleaseAll => self.release_all(),
        }
    }

    /// Apply queued commands without rendering.
    pub fn process_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
        if self.shared.release_pending.get() {
            self.shared.release_pending.set(false);
            self.release_all();
        }
    }
}

impl AudioRenderer for BankRenderer {
    fn render(&mut self, output: &mut [f32]) {
        self.process_commands();

        for frame in output.chunks_exact_mut(2) {
            let (metronome, others) = self.instruments.split_at_mut(1);
            let mut sample = metronome[0].next_sample() * self.metronome_amplitude;
            for instrument in others.iter_mut() {
                sample += instrument.next_sample();
            }
            let sample = sample.clamp(-1.0, 1.0);
            frame[0] = sample;
            frame[1] = sample;
        }
    }
}
