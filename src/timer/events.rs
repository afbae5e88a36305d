use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rewards::RewardColor;

use super::TimerPhase;

/// State changes published by an [`IntervalTimer`](super::IntervalTimer).
/// The shell subscribes to redraw and to react to completion.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    Started {
        phase: TimerPhase,
        total_seconds: u64,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        from: TimerPhase,
        to: TimerPhase,
        running: bool,
        at: DateTime<Utc>,
    },
    Stopped {
        phase: TimerPhase,
        remaining_seconds: u64,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
    /// All three phases ran out.
    Finished {
        experience_gained: f64,
        fill_color: RewardColor,
        at: DateTime<Utc>,
    },
}
