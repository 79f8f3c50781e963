//! Transport state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Start,
    Stop,
    Pause,
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    MotionChanged(MotionState),
}

/// Motion plus the "started" gate used by tempo adjustment.
///
/// `started` is set by `Start`, survives `Pause`/`Resume`, and is cleared by
/// `Stop`.
#[derive(Debug, Default)]
pub struct TransportFSM {
    motion: MotionState,
    started: bool,
}

impl TransportFSM {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion(&self) -> MotionState {
        self.motion
    }

    pub fn is_playing(&self) -> bool {
        self.motion == MotionState::Playing
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn transition(&mut self, event: TransportEvent) -> TransitionResult {
        use TransportEvent::*;

        match (event, self.motion) {
            (Start, MotionState::Playing) => TransitionResult::None,
            (Start, _) => {
                self.motion = MotionState::Playing;
                self.started = true;
                TransitionResult::MotionChanged(MotionState::Playing)
            }

            (Stop, MotionState::Playing | MotionState::Paused) => {
                self.motion = MotionState::Stopped;
                self.started = false;
                TransitionResult::MotionChanged(MotionState::Stopped)
            }
            (Stop, MotionState::Stopped) => TransitionResult::None,

            (Pause, MotionState::Playing) => {
                self.motion = MotionState::Paused;
                TransitionResult::MotionChanged(MotionState::Paused)
            }
            (Pause, _) => TransitionResult::None,

            (Resume, MotionState::Paused) => {
                self.motion = MotionState::Playing;
                TransitionResult::MotionChanged(MotionState::Playing)
            }
            (Resume, _) => TransitionResult::None,
        }
    }
}
