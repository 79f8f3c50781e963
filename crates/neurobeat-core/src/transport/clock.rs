//! Transport clock - the authoritative beat scheduler.
//!
//! Ticks are computed against an injected [`ClockSource`]: [`TransportClock::poll`]
//! fires the due beat stamped with its scheduled time rather than the time the
//! poll happened to run. The same stamp is handed to the audio trigger and then
//! to the visual observer, so the two never drift apart even when the poll is late.
//!
//! A poll fires at most one beat. After a stall longer than a beat interval the
//! missed beats are skipped, not replayed: the latest grid point that is due
//! fires and the grid keeps its phase.
//!
//! Tempo, timbre and session mode are plain atomics read once per tick. Writers
//! serialize on the FSM lock, which the tick also holds while triggering audio,
//! so a tick never sees a half-applied change and no beat is triggered after
//! `stop()` returns.

use super::fsm::{MotionState, TransitionResult, TransportEvent, TransportFSM};
use super::observer::{beat_interval, BeatEvent, BeatObserver, BeatTrigger};
use super::scheduler::SchedulerMsg;
use crate::{AtomicDouble, ClockSource, SessionMode, Timbre};
use arc_swap::ArcSwapOption;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransportClock {
    fsm: Mutex<TransportFSM>,
    tempo: Arc<AtomicU32>,
    session_mode: AtomicU8,
    timbre: AtomicU8,
    next_tick: AtomicDouble,
    paused_remaining: AtomicDouble,
    beats: AtomicU64,
    trigger: ArcSwapOption<Box<dyn BeatTrigger>>,
    observer: ArcSwapOption<Box<dyn BeatObserver>>,
    waker: ArcSwapOption<Sender<SchedulerMsg>>,
    clock: Arc<dyn ClockSource>,
}

impl TransportClock {
    /// Create a stopped transport. `bpm` is clamped into `mode`'s range.
    pub fn new(clock: Arc<dyn ClockSource>, bpm: u32, mode: SessionMode, timbre: Timbre) -> Self {
        let bpm = mode.tempo_range().clamp(bpm as i64);
        Self {
            fsm: Mutex::new(TransportFSM::new()),
            tempo: Arc::new(AtomicU32::new(bpm)),
            session_mode: AtomicU8::new(mode.into()),
            timbre: AtomicU8::new(timbre.into()),
            next_tick: AtomicDouble::new(0.0),
            paused_remaining: AtomicDouble::new(0.0),
            beats: AtomicU64::new(0),
            trigger: ArcSwapOption::empty(),
            observer: ArcSwapOption::empty(),
            waker: ArcSwapOption::empty(),
            clock,
        }
    }

    /// Current engine time.
    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &Arc<dyn ClockSource> {
        &self.clock
    }

    // ---- collaborators ---------------------------------------------------

    pub fn set_trigger(&self, trigger: Box<dyn BeatTrigger>) {
        self.trigger.store(Some(Arc::new(trigger)));
    }

    pub fn clear_trigger(&self) {
        self.trigger.store(None);
    }

    pub fn set_observer(&self, observer: Box<dyn BeatObserver>) {
        self.observer.store(Some(Arc::new(observer)));
    }

    pub fn clear_observer(&self) {
        self.observer.store(None);
    }

    pub fn has_observer(&self) -> bool {
        self.observer.load().is_some()
    }

    pub(crate) fn attach_waker(&self, waker: Sender<SchedulerMsg>) {
        self.waker.store(Some(Arc::new(waker)));
    }

    pub(crate) fn detach_waker(&self) {
        self.waker.store(None);
    }

    fn wake(&self) {
        if let Some(waker) = self.waker.load_full() {
            let _ = waker.send(SchedulerMsg::Wake);
        }
    }

    // ---- state -----------------------------------------------------------

    pub fn tempo(&self) -> u32 {
        self.tempo.load(Ordering::Acquire)
    }

    /// Shared tempo cell for readers on other threads (the voice scorer).
    pub fn tempo_shared(&self) -> &Arc<AtomicU32> {
        &self.tempo
    }

    pub fn session_mode(&self) -> SessionMode {
        SessionMode::from(self.session_mode.load(Ordering::Acquire))
    }

    pub fn timbre(&self) -> Timbre {
        Timbre::from(self.timbre.load(Ordering::Acquire))
    }

    pub fn motion(&self) -> MotionState {
        self.fsm.lock().motion()
    }

    pub fn is_playing(&self) -> bool {
        self.fsm.lock().is_playing()
    }

    /// True between `start` and `stop`, including while paused.
    pub fn has_started(&self) -> bool {
        self.fsm.lock().has_started()
    }

    /// Beats emitted since the transport last started from stop.
    pub fn beats_emitted(&self) -> u64 {
        self.beats.load(Ordering::Acquire)
    }

    /// Logical time of the next beat, if playing.
    pub fn next_tick_time(&self) -> Option<f64> {
        let fsm = self.fsm.lock();
        fsm.is_playing().then(|| self.next_tick.get())
    }

    // ---- mutations -------------------------------------------------------

    /// Clamp `bpm` into the current session range and store it.
    ///
    /// Refused (returns `false`) unless the transport has been started and not
    /// stopped since. Takes effect from the beat after the next scheduled one.
    pub fn set_tempo(&self, bpm: i64) -> bool {
        let fsm = self.fsm.lock();
        if !fsm.has_started() {
            debug!(bpm, "tempo change ignored: transport not started");
            return false;
        }
        let stored = self.store_tempo(bpm);
        drop(fsm);
        debug!(requested = bpm, stored, "tempo set");
        true
    }

    fn store_tempo(&self, bpm: i64) -> u32 {
        let clamped = self.session_mode().tempo_range().clamp(bpm);
        self.tempo.store(clamped, Ordering::Release);
        clamped
    }

    /// Switch session mode and pull the stored tempo into the new range.
    pub fn set_session_mode(&self, mode: SessionMode) {
        let _fsm = self.fsm.lock();
        self.session_mode.store(mode.into(), Ordering::Release);
        let current = self.tempo() as i64;
        let stored = self.store_tempo(current);
        info!(mode = mode.as_str(), bpm = stored, "session mode set");
    }

    /// Select the timbre used from the next tick on. Never stops the clock.
    pub fn set_timbre(&self, timbre: Timbre) {
        let _fsm = self.fsm.lock();
        self.timbre.store(timbre.into(), Ordering::Release);
        debug!(timbre = timbre.as_str(), "timbre set");
    }

    /// Start ticking at the current tempo. No-op (returns `false`) if already
    /// playing. The first beat fires immediately when starting from stop.
    pub fn start(&self) -> bool {
        self.start_inner(None)
    }

    /// Apply `bpm` (clamped, not gated) and start.
    pub fn start_with_tempo(&self, bpm: i64) -> bool {
        self.start_inner(Some(bpm))
    }

    fn start_inner(&self, bpm: Option<i64>) -> bool {
        let mut fsm = self.fsm.lock();
        if let Some(bpm) = bpm {
            self.store_tempo(bpm);
        }
        let previous = fsm.motion();
        if fsm.transition(TransportEvent::Start) == TransitionResult::None {
            return false;
        }

        let now = self.clock.now();
        if previous == MotionState::Paused {
            self.next_tick.set(now + self.paused_remaining.get());
        } else {
            self.beats.store(0, Ordering::Release);
            self.next_tick.set(now);
        }
        drop(fsm);

        self.wake();
        info!(bpm = self.tempo(), "transport started");
        true
    }

    /// Halt ticking and clear the started gate.
    pub fn stop(&self) -> bool {
        let mut fsm = self.fsm.lock();
        if fsm.transition(TransportEvent::Stop) == TransitionResult::None {
            return false;
        }
        drop(fsm);

        self.wake();
        info!(beats = self.beats_emitted(), "transport stopped");
        true
    }

    /// Halt ticking but keep the started gate and the beat phase.
    pub fn pause(&self) -> bool {
        let mut fsm = self.fsm.lock();
        if fsm.transition(TransportEvent::Pause) == TransitionResult::None {
            return false;
        }
        let remaining = (self.next_tick.get() - self.clock.now()).max(0.0);
        self.paused_remaining.set(remaining);
        drop(fsm);

        self.wake();
        info!("transport paused");
        true
    }

    /// Continue from pause, keeping tempo and beat phase.
    pub fn resume(&self) -> bool {
        let mut fsm = self.fsm.lock();
        if fsm.transition(TransportEvent::Resume) == TransitionResult::None {
            return false;
        }
        self.next_tick
            .set(self.clock.now() + self.paused_remaining.get());
        drop(fsm);

        self.wake();
        info!("transport resumed");
        true
    }

    // ---- ticking ---------------------------------------------------------

    /// Fire the beat due at the current clock time, if any.
    ///
    /// Returns the logical time of the next beat, or `None` when not playing.
    pub fn poll(&self) -> Option<f64> {
        let now = self.clock.now();

        let (fired, next) = {
            let fsm = self.fsm.lock();
            if !fsm.is_playing() {
                return None;
            }

            let mut next = self.next_tick.get();
            if next > now {
                return Some(next);
            }

            let bpm = self.tempo();
            let interval = beat_interval(bpm);
            let behind = now - next;
            if behind >= interval {
                let skipped = (behind / interval).floor();
                next += skipped * interval;
                if next > now {
                    next -= interval;
                }
                while next + interval <= now {
                    next += interval;
                }
                warn!(skipped, bpm, "transport fell behind, skipping missed beats");
            }

            let event = BeatEvent {
                index: self.beats.fetch_add(1, Ordering::AcqRel),
                time: next,
                timbre: self.timbre(),
                bpm,
            };
            if let Some(trigger) = self.trigger.load_full() {
                trigger.trigger(&event);
            }
            next += interval;
            self.next_tick.set(next);
            (event, next)
        };

        if let Some(observer) = self.observer.load_full() {
            observer.on_beat(&fired);
        }

        Some(next)
    }
}
