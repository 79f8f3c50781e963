//! Headless audio integration tests
//!
//! Renders the timbre bank through the engine's headless output.

use crate::helpers::*;
use neurobeat::prelude::*;

fn frames(seconds: f64) -> usize {
    (seconds * TEST_SAMPLE_RATE) as usize
}

fn left(stereo: &[f32]) -> Vec<f32> {
    stereo.iter().step_by(2).copied().collect()
}

/// Peak of the first beat at `timbre` and metronome `gain`.
fn first_beat_peak(timbre: Timbre, gain: f32) -> f32 {
    let (_clock, engine) = test_engine();
    engine.set_sound_type(timbre);
    engine.initialize();
    engine.set_volume(gain);
    engine.start(60);
    engine.pump();
    peak(&engine.render_offline(frames(0.2)).unwrap())
}

#[test]
fn test_silent_until_first_beat() {
    let (_clock, engine) = test_engine();
    engine.initialize();
    let audio = engine.render_offline(frames(0.1)).unwrap();
    assert!(is_silent(&audio));

    engine.start(60);
    engine.pump();
    let audio = engine.render_offline(frames(0.1)).unwrap();
    assert!(peak(&audio) > 0.1);
}

#[test]
fn test_output_is_dual_mono() {
    let (_clock, engine) = test_engine();
    engine.set_sound_type(Timbre::Drum);
    engine.initialize();
    engine.start(60);
    engine.pump();

    let audio = engine.render_offline(frames(0.05)).unwrap();
    for frame in audio.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

#[test]
fn test_every_timbre_is_audible() {
    for timbre in Timbre::ALL {
        let peak = first_beat_peak(timbre, 1.0);
        assert!(peak > 0.05, "{timbre} peak {peak}");
        assert!(peak <= 1.0);
    }
}

#[test]
fn test_volume_applies_to_metronome_only() {
    let full = first_beat_peak(Timbre::Metronome, 1.0);
    let floored = first_beat_peak(Timbre::Metronome, 0.0);
    // Zero gain is floored at -60 dB rather than muted
    assert!(floored > 0.0);
    assert!((floored / full - 0.001).abs() < 1e-5);

    let drum_full = first_beat_peak(Timbre::Drum, 1.0);
    let drum_quiet = first_beat_peak(Timbre::Drum, 0.0);
    assert_eq!(drum_full, drum_quiet);
}

#[test]
fn test_stop_releases_ringing_voices() {
    let render_after = |stop: bool| {
        let (_clock, engine) = test_engine();
        engine.set_sound_type(Timbre::Piano);
        engine.initialize();
        engine.start(40);
        engine.pump();
        engine.render_offline(frames(0.1)).unwrap();
        if stop {
            engine.stop();
        }
        let tail = engine.render_offline(frames(1.4)).unwrap();
        left(&tail[2 * frames(1.3)..])
    };

    assert!(is_silent(&render_after(true)));
    assert!(!is_silent(&render_after(false)));
}

#[test]
fn test_render_offline_requires_initialize() {
    let (_clock, engine) = test_engine();
    assert_eq!(engine.render_offline(32), None);
    engine.initialize();
    assert_eq!(engine.render_offline(32).map(|b| b.len()), Some(64));
}

#[test]
fn test_stop_releases_voices_behind_a_full_queue() {
    let (_clock, engine) = test_engine();
    engine.set_sound_type(Timbre::Piano);
    engine.initialize();
    engine.start(40);
    engine.pump();
    engine.render_offline(frames(0.1)).unwrap();

    // Volume changes that the stalled audio side never drains
    for _ in 0..300 {
        engine.set_volume(0.8);
    }
    assert!(engine.stop());

    let tail = engine.render_offline(frames(1.4)).unwrap();
    assert!(is_silent(&left(&tail[2 * frames(1.3)..])));
}
