use log::debug;
use serde::{Deserialize, Serialize};

/// Experience per configured second of focus (Initial and Final phases).
const FOCUS_XP_PER_SEC: f64 = 0.15;
/// Experience per configured second of break.
const BREAK_XP_PER_SEC: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Initial,
    Break,
    Final,
    Finished,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Initial
    }
}

impl TimerPhase {
    pub fn next(self) -> Option<TimerPhase> {
        match self {
            TimerPhase::Initial => Some(TimerPhase::Break),
            TimerPhase::Break => Some(TimerPhase::Final),
            TimerPhase::Final => Some(TimerPhase::Finished),
            TimerPhase::Finished => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Initial => "Initial",
            TimerPhase::Break => "Break",
            TimerPhase::Final => "Final",
            TimerPhase::Finished => "Finished",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDuration {
    pub minutes: u64,
    pub seconds: u64,
}

impl PhaseDuration {
    pub fn new(minutes: u64, seconds: u64) -> Self {
        Self { minutes, seconds }
    }

    /// Builds a duration from raw text fields; anything unparsable counts as zero.
    pub fn parse(minutes: &str, seconds: &str) -> Self {
        Self {
            minutes: parse_field(minutes),
            seconds: parse_field(seconds),
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

fn parse_field(text: &str) -> u64 {
    match text.parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            if !text.is_empty() {
                debug!("coercing non-numeric duration input {text:?} to 0");
            }
            0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDurations {
    pub initial: PhaseDuration,
    #[serde(rename = "break")]
    pub break_: PhaseDuration,
    #[serde(rename = "final")]
    pub final_: PhaseDuration,
}

impl PhaseDurations {
    /// `Finished` has no duration of its own.
    pub fn get(&self, phase: TimerPhase) -> PhaseDuration {
        match phase {
            TimerPhase::Initial => self.initial,
            TimerPhase::Break => self.break_,
            TimerPhase::Final => self.final_,
            TimerPhase::Finished => PhaseDuration::default(),
        }
    }

    pub fn set(&mut self, phase: TimerPhase, duration: PhaseDuration) {
        match phase {
            TimerPhase::Initial => self.initial = duration,
            TimerPhase::Break => self.break_ = duration,
            TimerPhase::Final => self.final_ = duration,
            TimerPhase::Finished => debug!("ignoring duration for Finished phase"),
        }
    }

    /// Experience earned for completing all three phases.
    pub fn experience_reward(&self) -> f64 {
        let focus_secs = self.initial.total_seconds() + self.final_.total_seconds();
        let break_secs = self.break_.total_seconds();
        focus_secs as f64 * FOCUS_XP_PER_SEC + break_secs as f64 * BREAK_XP_PER_SEC
    }
}

/// What a single tick did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running; nothing changed.
    Idle,
    Counting { remaining_seconds: u64 },
    /// A phase ran out. `running` is false when the next phase has no duration.
    Advanced {
        from: TimerPhase,
        to: TimerPhase,
        running: bool,
    },
    Finished,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: TimerPhase,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub timer_finished: bool,
    pub durations: PhaseDurations,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, phase: TimerPhase, duration: PhaseDuration) {
        self.durations.set(phase, duration);
    }

    /// Loads the configured duration for the current phase and starts counting.
    ///
    /// Returns false without touching anything when already running or when
    /// the phase has no duration. A stopped timer restarts from the full
    /// configured duration, not from `remaining_seconds`.
    pub fn start(&mut self) -> bool {
        if self.is_running {
            return false;
        }
        let total = self.durations.get(self.phase).total_seconds();
        if total == 0 {
            debug!("not starting {} phase: no duration", self.phase.as_str());
            return false;
        }
        self.remaining_seconds = total;
        self.is_running = true;
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Counting {
                remaining_seconds: self.remaining_seconds,
            };
        }

        self.is_running = false;
        let from = self.phase;
        match from.next() {
            Some(TimerPhase::Finished) => {
                self.phase = TimerPhase::Finished;
                self.timer_finished = true;
                TickOutcome::Finished
            }
            Some(to) => {
                self.phase = to;
                let running = self.start();
                TickOutcome::Advanced { from, to, running }
            }
            None => TickOutcome::Idle,
        }
    }

    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
