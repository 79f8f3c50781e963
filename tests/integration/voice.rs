//! Voice synchronization integration tests
//!
//! Onsets are produced by a fake microphone and scored through the engine.

use crate::helpers::*;
use neurobeat::prelude::*;

#[test]
fn test_slightly_off_onsets_score_89() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();
    engine.start(60);

    speak_at(&clock, &engine, &voice, &[0.0, 1.02, 2.00, 2.98, 4.01]);

    // Deviations 0.02, 0.02, 0.02, 0.03 → average 0.0225 s of a 1 s beat
    assert_eq!(engine.voice_sync_accuracy(), 89);
    assert_eq!(engine.voice_history().len(), 5);
}

#[test]
fn test_onsets_on_the_beat_score_100() {
    for bpm in [48, 60, 90, 144] {
        let (clock, engine, voice) = voice_engine();
        engine.initialize();
        engine.start(bpm);

        let interval = 60.0 / bpm as f64;
        let onsets: Vec<f64> = (0..6).map(|i| 3.0 + i as f64 * interval).collect();
        speak_at(&clock, &engine, &voice, &onsets);
        assert_eq!(engine.voice_sync_accuracy(), 100, "bpm {bpm}");
    }
}

#[test]
fn test_unrelated_vocalizations_keep_score() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();
    engine.start(60);

    speak_at(&clock, &engine, &voice, &[0.0, 1.0, 2.04]);
    let before = engine.voice_sync_accuracy();
    assert_eq!(before, 90);

    // Once the old onsets age out, every pair is far off the beat
    speak_at(&clock, &engine, &voice, &[20.0, 20.1, 20.2, 20.3, 20.4]);
    assert_eq!(engine.voice_history().len(), 5);
    assert_eq!(engine.voice_sync_accuracy(), before);
}

#[test]
fn test_silence_never_resets_score() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();
    engine.start(60);
    speak_at(&clock, &engine, &voice, &[0.0, 1.0, 2.0]);
    assert_eq!(engine.voice_sync_accuracy(), 100);

    for t in 3..30 {
        clock.set(t as f64);
        engine.pump();
    }
    assert_eq!(engine.voice_sync_accuracy(), 100);
    assert!(!engine.is_voice_active());
}

#[test]
fn test_voice_activity_window() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();
    assert!(!engine.is_voice_active());

    speak_at(&clock, &engine, &voice, &[5.0]);
    assert!(engine.is_voice_active());
    clock.set(5.5);
    assert!(engine.is_voice_active());
    clock.set(6.0);
    assert!(!engine.is_voice_active());
}

#[test]
fn test_volume_reported_below_threshold() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();

    clock.set(1.0);
    voice.set_level(0.005);
    engine.pump();

    let volume = engine.voice_volume();
    assert!(volume > 0.0 && volume < 0.01, "volume {volume}");
    assert!(engine.voice_history().is_empty());
    assert!(!engine.is_voice_active());
}

#[test]
fn test_history_keeps_last_ten_seconds() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();

    speak_at(&clock, &engine, &voice, &[0.0, 4.0, 9.0, 12.5]);
    assert_eq!(engine.voice_history(), vec![4.0, 9.0, 12.5]);
}

#[test]
fn test_voice_detection_independent_of_transport() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();

    // Before any start
    speak_at(&clock, &engine, &voice, &[1.0]);
    assert_eq!(engine.voice_history(), vec![1.0]);

    engine.start(60);
    engine.stop();
    speak_at(&clock, &engine, &voice, &[2.0]);
    assert_eq!(engine.voice_history(), vec![1.0, 2.0]);
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[test]
fn test_threaded_voice_polling() {
    use std::time::{Duration, Instant};

    let voice = FakeVoice::new();
    let engine = BeatEngine::builder()
        .headless()
        .waveform_size(TEST_WAVEFORM_SIZE)
        .waveform_source(voice.source())
        .poll_interval_ms(5)
        .build()
        .unwrap();
    assert!(engine.initialize());
    assert!(engine.is_voice_enabled());

    voice.set_level(VOICE_LEVEL);
    let deadline = Instant::now() + Duration::from_secs(2);
    while !engine.is_voice_active() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(engine.is_voice_active());
    assert!(engine.voice_volume() > 0.1);

    // Disposing stops polling promptly
    let started = Instant::now();
    engine.dispose();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!engine.is_voice_enabled());
}
