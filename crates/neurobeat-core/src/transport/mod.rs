pub(crate) mod clock;
pub(crate) mod fsm;
pub(crate) mod observer;
pub(crate) mod scheduler;

pub use clock::TransportClock;
pub use fsm::{MotionState, TransitionResult, TransportEvent, TransportFSM};
pub use observer::{beat_interval, BeatEvent, BeatObserver, BeatTrigger};
pub use scheduler::{Scheduler, SchedulerMsg};
