pub mod controller;
pub mod events;
pub mod state;

pub use controller::{IntervalTimer, SharedProgress, TimerSnapshot};
pub use events::TimerEvent;
pub use state::{PhaseDuration, PhaseDurations, TickOutcome, TimerPhase, TimerState};
