//! Engine lifecycle integration tests
//!
//! Initialization, degraded microphone, fatal audio init, and dispose.

use crate::helpers::*;
use neurobeat::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[test]
fn test_initialize_reaches_ready() {
    let (_clock, engine) = test_engine();
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.initialize());
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.sample_rate(), Some(TEST_SAMPLE_RATE));
}

#[test]
fn test_microphone_denied_is_not_fatal() {
    let (clock, engine) = denied_microphone_engine();

    assert!(engine.initialize());
    assert_eq!(engine.state(), EngineState::Ready);
    assert!(!engine.is_voice_enabled());
    assert!(!engine.is_voice_active());
    assert_eq!(engine.voice_sync_accuracy(), 0);
    assert_eq!(engine.voice_volume(), 0.0);

    // Playback is unaffected: start(90) ticks and the beat is audible
    let beats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&beats);
    engine.set_beat_callback(move |_: &BeatEvent| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    assert!(engine.start(90));
    assert_eq!(engine.tempo(), 90);
    engine.pump();
    clock.advance(1.0);
    engine.pump();
    assert_eq!(beats.load(Ordering::Relaxed), 2);

    let audio = engine.render_offline(4800).unwrap();
    assert!(peak(&audio) > 0.05, "expected an audible beat, peak {}", peak(&audio));
}

#[test]
fn test_default_microphone_without_capture_support_degrades() {
    // With `cpal` a machine without a microphone degrades, and without it
    // there is nothing to capture from. Either way initialize must succeed.
    let clock = Arc::new(ManualClock::new());
    let engine = BeatEngine::builder()
        .headless()
        .clock(clock)
        .manual_drive()
        .build()
        .unwrap();
    assert!(engine.initialize());
    assert_eq!(engine.state(), EngineState::Ready);
    #[cfg(not(feature = "cpal"))]
    assert!(!engine.is_voice_enabled());
}

#[cfg(not(feature = "cpal"))]
#[test]
fn test_audio_backend_failure_is_fatal() {
    let clock = Arc::new(ManualClock::new());
    let engine = BeatEngine::builder()
        .audio_backend(AudioBackend::Cpal { device_index: None })
        .no_microphone()
        .clock(clock)
        .manual_drive()
        .build()
        .unwrap();

    assert!(!engine.initialize());
    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(!engine.start(90));
    assert_eq!(engine.pump(), None);
    assert_eq!(engine.render_offline(64), None);

    // Still disposable
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Disposed);
}

#[test]
fn test_dispose_twice_leaves_nothing_running() {
    let (clock, engine, voice) = voice_engine();
    let beats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&beats);
    engine.set_beat_callback(move |_: &BeatEvent| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    assert!(engine.initialize());
    assert!(engine.is_voice_enabled());
    engine.start(120);
    engine.pump();

    engine.dispose();
    engine.dispose();
    assert_eq!(engine.state(), EngineState::Disposed);
    assert!(!engine.is_voice_enabled());

    let fired = beats.load(Ordering::Relaxed);
    clock.advance(5.0);
    voice.set_level(VOICE_LEVEL);
    assert_eq!(engine.pump(), None);
    assert_eq!(beats.load(Ordering::Relaxed), fired);
    assert!(engine.voice_history().is_empty());
}

#[test]
fn test_dispose_from_any_state() {
    for advance_to in [0, 1, 2, 3, 4] {
        let (_clock, engine) = test_engine();
        if advance_to >= 1 {
            engine.initialize();
        }
        if advance_to >= 2 {
            engine.start(100);
        }
        if advance_to >= 3 {
            engine.pause();
        }
        if advance_to >= 4 {
            engine.stop();
        }
        engine.dispose();
        assert_eq!(engine.state(), EngineState::Disposed);
    }
}

#[test]
fn test_threaded_engine_ticks_and_disposes() {
    use std::time::{Duration, Instant};

    let engine = BeatEngine::builder()
        .headless()
        .no_microphone()
        .build()
        .unwrap();
    let beats = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&beats);
    engine.set_beat_callback(move |_: &BeatEvent| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    assert!(engine.initialize());
    assert!(engine.start(200));

    let deadline = Instant::now() + Duration::from_secs(2);
    while beats.load(Ordering::Relaxed) < 2 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(beats.load(Ordering::Relaxed) >= 2);

    let started = Instant::now();
    engine.dispose();
    assert!(started.elapsed() < Duration::from_secs(1));

    let after = beats.load(Ordering::Relaxed);
    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(beats.load(Ordering::Relaxed), after);
}

#[test]
fn test_callback_may_call_back_into_engine() {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    let engine = Arc::new(
        BeatEngine::builder()
            .headless()
            .no_microphone()
            .build()
            .unwrap(),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&engine);
    let sink = Arc::clone(&seen);
    engine.set_beat_callback(move |_: &BeatEvent| {
        if let Some(engine) = weak.upgrade() {
            sink.lock().unwrap().push(engine.state());
        }
    });

    engine.initialize();
    engine.start(200);

    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.lock().unwrap().is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    engine.stop();
    engine.dispose();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|s| matches!(
        s,
        EngineState::Playing | EngineState::Stopped | EngineState::Disposed
    )));
}

#[test]
fn test_session_summary_after_stop() {
    let (clock, engine) = test_engine();
    engine.set_session_type(SessionMode::SpeechRhythm);
    engine.set_sound_type(Timbre::SoftBell);
    engine.initialize();

    assert!(engine.start(100));
    engine.pump();
    clock.set(3.0);
    engine.pump();
    engine.set_tempo(120);
    clock.set(6.0);
    engine.pump();
    assert!(engine.stop());
    clock.set(60.0);

    let summary = engine.session_summary();
    assert_eq!(summary.session_mode, SessionMode::SpeechRhythm);
    assert_eq!(summary.timbre, Timbre::SoftBell);
    assert_eq!(summary.initial_bpm, 100);
    assert_eq!(summary.final_bpm, 120);
    assert!((summary.duration_secs - 6.0).abs() < tolerances::FLOAT_EPSILON);
    assert_eq!(summary.beats_emitted, engine.beats_emitted());
    assert_eq!(summary.accuracy_score, 0);

    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"soft_bell\""));
}

#[test]
fn test_suggested_tempo_follows_accuracy() {
    let (clock, engine, voice) = voice_engine();
    engine.initialize();
    engine.start(100);

    // No score yet: accuracy 0 suggests slowing down
    let suggestion = engine.suggested_tempo();
    assert_eq!(suggestion.bpm, 98);
    assert!(suggestion.adjusted);

    // Perfect onsets at 100 bpm (0.6 s apart)
    let onsets: Vec<f64> = (0..5).map(|i| i as f64 * 0.6).collect();
    speak_at(&clock, &engine, &voice, &onsets);
    assert_eq!(engine.voice_sync_accuracy(), 100);

    let suggestion = engine.suggested_tempo();
    assert_eq!(suggestion.bpm, 101);
    assert_eq!(engine.tempo(), 100);
}
