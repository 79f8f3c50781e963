//! A single sounding note: a FunDSP chain driven by pitch and gate controls.
//!
//! The chain has two outputs, the raw oscillator and the envelope, so the
//! voice can tell when its release has run out. The gate closes after the
//! patch's tempo-relative note length.

use crate::patch::{membrane_frequency, Oscillator, Patch};
use fundsp::prelude::{
    adsr_live, lowpole_hz, noise, shape_fn, shared, sine, triangle, var, AudioUnit, Shared,
};

/// Envelope level below which a released voice is finished.
const SILENCE_FLOOR: f32 = 1.0e-6;

/// How long a closed gate is held before the voice can retrigger.
/// `adsr_live` samples its control at 2 ms intervals and misses shorter dips.
const GATE_SETTLE_SECS: f64 = 0.01;

/// Brown noise as a leaky integrator of white noise, normalized to about
/// 0.2 RMS. Brighter than FunDSP's `brown()`, which sits near 10 Hz.
const BROWN_CUTOFF_HZ: f32 = 137.5;
const BROWN_GAIN: f32 = 3.5;

pub struct Voice {
    patch: Patch,
    /// Oscillator frequency (Hz)
    pitch: Shared,
    /// Envelope control (0.0 = off, 1.0 = on)
    gate: Shared,
    dsp: Box<dyn AudioUnit>,
    sample_rate: f32,
    settle_samples: u64,
    gate_open: bool,
    /// Samples left before a closed gate may reopen.
    settling: u64,
    /// Gate length of a note waiting for the gate to settle.
    pending: Option<u64>,
    /// Rings out without output, after its instrument was swapped away.
    muted: bool,
    envelope_level: f32,
    age: u64,
    gate_samples: u64,
    /// Monotonic trigger order, for oldest-voice stealing.
    started_at: u64,
}

impl Voice {
    pub fn new(patch: Patch, sample_rate: f32) -> Self {
        let pitch = shared(patch.frequency());
        let gate = shared(0.0);
        let mut dsp = build_voice_dsp(&patch, &pitch, &gate);
        dsp.set_sample_rate(sample_rate as f64);

        // The envelope has to see the gate closed before the first note can
        // trigger its attack.
        let settle_samples = (GATE_SETTLE_SECS * sample_rate as f64).ceil() as u64;
        let mut frame = [0.0f32; 2];
        for _ in 0..settle_samples {
            dsp.tick(&[], &mut frame);
        }

        Self {
            patch,
            pitch,
            gate,
            dsp,
            sample_rate,
            settle_samples,
            gate_open: false,
            settling: 0,
            pending: None,
            muted: false,
            envelope_level: 0.0,
            age: 0,
            gate_samples: 0,
            started_at: 0,
        }
    }

    /// Start a note held for `duration` seconds before release.
    ///
    /// A voice whose gate is still open is closed first and retriggers once
    /// the envelope has seen the gap.
    pub fn note_on(&mut self, duration: f32, order: u64) {
        let gate_samples = (duration.max(0.0) * self.sample_rate) as u64;
        self.started_at = order;
        self.muted = false;

        if self.gate_open {
            self.close_gate();
        }
        if self.settling > 0 {
            self.pending = Some(gate_samples);
        } else {
            self.open_gate(gate_samples);
        }
    }

    pub fn release(&mut self) {
        self.pending = None;
        if self.gate_open {
            self.close_gate();
        }
    }

    /// Release and drop the remaining tail from the output.
    pub fn silence(&mut self) {
        self.release();
        self.muted = true;
    }

    pub fn is_active(&self) -> bool {
        self.gate_open
            || self.pending.is_some()
            || self.settling > 0
            || self.envelope_level > SILENCE_FLOOR
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    pub fn envelope_level(&self) -> f32 {
        self.envelope_level
    }

    fn open_gate(&mut self, gate_samples: u64) {
        self.pending = None;
        self.age = 0;
        self.gate_samples = gate_samples;
        self.pitch.set(self.start_frequency());
        self.gate.set(1.0);
        self.gate_open = true;
    }

    fn close_gate(&mut self) {
        self.gate.set(0.0);
        self.gate_open = false;
        self.settling = self.settle_samples;
    }

    fn start_frequency(&self) -> f32 {
        match self.patch.oscillator {
            Oscillator::Membrane { octaves, .. } => self.patch.frequency() * octaves,
            _ => self.patch.frequency(),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.is_active() {
            return 0.0;
        }

        if self.gate_open {
            if self.age >= self.gate_samples {
                self.close_gate();
            }
        } else if self.settling > 0 {
            self.settling -= 1;
            if self.settling == 0 {
                if let Some(gate_samples) = self.pending {
                    self.open_gate(gate_samples);
                }
            }
        }

        if let Oscillator::Membrane {
            octaves,
            pitch_decay,
        } = self.patch.oscillator
        {
            let elapsed = self.age as f32 / self.sample_rate;
            self.pitch.set(membrane_frequency(
                self.patch.frequency(),
                octaves,
                pitch_decay,
                elapsed,
            ));
        }

        let mut frame = [0.0f32; 2];
        self.dsp.tick(&[], &mut frame);
        self.envelope_level = frame[1];
        self.age += 1;

        if self.muted {
            return 0.0;
        }
        frame[0] * frame[1] * self.patch.level
    }
}

/// Build a voice DSP chain: output 0 is the oscillator, output 1 the envelope.
fn build_voice_dsp(patch: &Patch, pitch: &Shared, gate: &Shared) -> Box<dyn AudioUnit> {
    let e = patch.envelope;

    // adsr_live ramps linearly. Squaring its output bends decay and release
    // into a falling curve; sustain is pre-rooted to keep the patched level.
    let envelope = var(gate)
        >> adsr_live(e.attack, e.decay, e.sustain.sqrt(), e.release)
        >> shape_fn(|level: f32| level * level);

    match patch.oscillator {
        Oscillator::Sine => Box::new((var(pitch) >> sine::<f32>()) | envelope),
        Oscillator::Triangle | Oscillator::Membrane { .. } => {
            Box::new((var(pitch) >> triangle()) | envelope)
        }
        Oscillator::BrownNoise => Box::new(
            ((noise() >> lowpole_hz(BROWN_CUTOFF_HZ)) * BROWN_GAIN) | envelope,
        ),
    }
}
