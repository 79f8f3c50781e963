//! Transport integration tests
//!
//! Tempo clamping and gating, pause/resume, and beat callback alignment,
//! all driven through the engine on a manual clock.

use crate::helpers::*;
use neurobeat::prelude::*;
use std::sync::{Arc, Mutex};

fn record_beats(engine: &BeatEngine) -> Arc<Mutex<Vec<BeatEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.set_beat_callback(move |event: &BeatEvent| {
        sink.lock().unwrap().push(*event);
    });
    events
}

fn frames(seconds: f64) -> usize {
    (seconds * TEST_SAMPLE_RATE) as usize
}

fn times(events: &Mutex<Vec<BeatEvent>>) -> Vec<f64> {
    events.lock().unwrap().iter().map(|e| e.time).collect()
}

#[test]
fn test_start_clamps_to_session_range() {
    let (_clock, engine) = test_engine();
    engine.initialize();

    assert!(engine.start(10));
    assert_eq!(engine.tempo(), 40);
    assert!(engine.start(1000));
    assert_eq!(engine.tempo(), 200);

    engine.set_session_type(SessionMode::SpeechRhythm);
    assert_eq!(engine.tempo(), 180);
    assert!(engine.set_tempo(-5));
    assert_eq!(engine.tempo(), 80);
}

#[test]
fn test_tempo_gated_on_started_session() {
    let (_clock, engine) = test_engine();
    engine.initialize();
    assert!(!engine.set_tempo(100));

    engine.start(90);
    assert!(engine.set_tempo(100));
    engine.pause();
    assert!(engine.set_tempo(110));
    assert_eq!(engine.tempo(), 110);

    engine.stop();
    assert!(!engine.set_tempo(120));
    assert_eq!(engine.tempo(), 110);
}

#[test]
fn test_callback_times_are_logical_beat_times() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(120);
    engine.pump();

    // A late pump still stamps the beat with its own time
    clock.set(0.7);
    assert_eq!(engine.pump(), Some(1.0));
    assert_eq!(times(&events), vec![0.0, 0.5]);

    run_until(&clock, &engine, 2.0);
    assert_eq!(times(&events), vec![0.0, 0.5, 1.0, 1.5, 2.0]);

    let indices: Vec<u64> = events.lock().unwrap().iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_stalled_pump_fires_one_beat() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(200);
    engine.pump();
    engine.render_offline(frames(0.5)).unwrap();

    clock.set(60.0);
    let next = engine.pump().unwrap();
    assert_eq!(engine.beats_emitted(), 2);
    assert!(next > 60.0 && next <= 60.3 + tolerances::FLOAT_EPSILON);

    let late = events.lock().unwrap()[1];
    assert!(late.time <= 60.0 && late.time > 59.7);

    // A single metronome click, not a pile of simultaneous ones
    let audio = engine.render_offline(frames(0.1)).unwrap();
    assert!(peak(&audio) > 0.1);
    assert!(peak(&audio) < 0.9, "burst peak {}", peak(&audio));
}

#[test]
fn test_tempo_change_applies_after_scheduled_beat() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(60);
    engine.pump();

    clock.set(0.5);
    engine.set_tempo(120);
    run_until(&clock, &engine, 1.6);

    // The beat already scheduled for 1.0 keeps its time
    assert_eq!(times(&events), vec![0.0, 1.0, 1.5]);
    assert_eq!(events.lock().unwrap()[1].bpm, 120);
}

#[test]
fn test_pause_resume_keeps_tempo_and_phase() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(75);
    engine.set_tempo(97);
    engine.pump();
    let before = engine.tempo();

    clock.set(0.25);
    assert!(engine.pause());
    clock.set(30.0);
    assert_eq!(engine.pump(), None);
    assert!(engine.resume());
    assert_eq!(engine.tempo(), before);

    // The first tick read the updated tempo; 0.25 s of its interval had elapsed
    let remaining = 60.0 / 97.0 - 0.25;
    let next = engine.pump().unwrap();
    assert!((next - (30.0 + remaining)).abs() < tolerances::FLOAT_EPSILON);
    assert_eq!(times(&events).len(), 1);
}

#[test]
fn test_sound_change_on_next_tick_without_stopping() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(60);
    engine.pump();

    assert!(engine.set_sound_type(Timbre::WoodenBlock));
    assert!(engine.is_playing());
    clock.set(1.0);
    engine.pump();
    engine.set_sound_type_name("not-a-sound");
    clock.set(2.0);
    engine.pump();

    let timbres: Vec<Timbre> = events.lock().unwrap().iter().map(|e| e.timbre).collect();
    assert_eq!(
        timbres,
        vec![Timbre::Metronome, Timbre::WoodenBlock, Timbre::Metronome]
    );
}

#[test]
fn test_stop_takes_effect_before_next_tick() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(60);
    engine.pump();
    clock.set(0.9);
    assert!(engine.stop());

    clock.set(5.0);
    assert_eq!(engine.pump(), None);
    assert_eq!(times(&events), vec![0.0]);
    assert_eq!(engine.beats_emitted(), 1);

    // A new session counts from zero
    assert!(engine.start(60));
    engine.pump();
    assert_eq!(events.lock().unwrap().last().unwrap().index, 0);
    assert_eq!(events.lock().unwrap().last().unwrap().time, 5.0);
}

#[test]
fn test_ticks_without_callback() {
    let (clock, engine) = test_engine();
    engine.initialize();
    engine.start(60);
    run_until(&clock, &engine, 3.0);
    assert_eq!(engine.beats_emitted(), 4);

    let audio = engine.render_offline(2400).unwrap();
    assert!(!is_silent(&audio));
}

#[test]
fn test_clear_beat_callback() {
    let (clock, engine) = test_engine();
    let events = record_beats(&engine);
    engine.initialize();
    engine.start(60);
    engine.pump();
    engine.clear_beat_callback();
    run_until(&clock, &engine, 2.0);
    assert_eq!(times(&events), vec![0.0]);
    assert_eq!(engine.beats_emitted(), 3);
}
