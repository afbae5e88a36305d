use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{audio::CompletionCue, progress::ProgressTracker, rewards::RewardColor};

use super::{PhaseDuration, TickOutcome, TimerEvent, TimerPhase, TimerState};

pub type SharedProgress = Arc<Mutex<ProgressTracker>>;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub timer_finished: bool,
}

impl TimerSnapshot {
    /// Background for the timer screen: black while counting, the selected
    /// reward color (green if none) once the session is finished.
    pub fn fill_color(&self, selected: Option<RewardColor>) -> RewardColor {
        if self.timer_finished {
            selected.unwrap_or(RewardColor::Green)
        } else {
            RewardColor::Black
        }
    }
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            phase: state.phase,
            remaining_seconds: state.remaining_seconds,
            is_running: state.is_running,
            timer_finished: state.timer_finished,
        }
    }
}

/// Owns the repeating tick task. Dropping it cancels the task.
struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Everything the tick task needs; shared with the controller.
#[derive(Clone)]
struct TickContext {
    state: Arc<Mutex<TimerState>>,
    progress: SharedProgress,
    events: broadcast::Sender<TimerEvent>,
    cue: Arc<dyn CompletionCue>,
}

impl TickContext {
    /// One tick plus its side effects.
    ///
    /// Lock order is progress, then state. Nothing awaits after the tick, so
    /// cancelling the task can never leave a finished timer without its award
    /// and completion event.
    async fn step(&self) -> TickOutcome {
        let mut progress = self.progress.lock().await;
        let mut state = self.state.lock().await;
        let outcome = state.tick();

        match outcome {
            TickOutcome::Advanced { from, to, running } => {
                info!(
                    "phase {} -> {} ({})",
                    from.as_str(),
                    to.as_str(),
                    if running { "running" } else { "halted, no duration" }
                );
                self.emit(TimerEvent::PhaseAdvanced {
                    from,
                    to,
                    running,
                    at: Utc::now(),
                });
            }
            TickOutcome::Finished => {
                let experience_gained = state.durations.experience_reward();
                progress.add_experience(experience_gained);
                let fill_color = progress.selected_color().unwrap_or(RewardColor::Green);
                info!("timer finished, awarded {experience_gained:.2} xp");

                self.cue.play_completion();
                self.emit(TimerEvent::Finished {
                    experience_gained,
                    fill_color,
                    at: Utc::now(),
                });
            }
            TickOutcome::Counting { .. } | TickOutcome::Idle => {}
        }

        outcome
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Three-phase countdown driven by a one-second tokio interval.
///
/// Clones share the same state and tick task. When the last clone is
/// dropped the tick task is cancelled.
#[derive(Clone)]
pub struct IntervalTimer {
    ctx: TickContext,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
}

impl IntervalTimer {
    pub fn new(progress: SharedProgress, cue: Arc<dyn CompletionCue>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            ctx: TickContext {
                state: Arc::new(Mutex::new(TimerState::new())),
                progress,
                events,
                cue,
            },
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.ctx.events.subscribe()
    }

    pub async fn get_state(&self) -> TimerState {
        self.ctx.state.lock().await.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&*self.ctx.state.lock().await)
    }

    pub async fn configure(&self, phase: TimerPhase, duration: PhaseDuration) {
        self.ctx.state.lock().await.configure(phase, duration);
    }

    /// Configures a phase from raw text fields. Unparsable input becomes zero.
    pub async fn configure_from_input(&self, phase: TimerPhase, minutes: &str, seconds: &str) {
        self.configure(phase, PhaseDuration::parse(minutes, seconds))
            .await;
    }

    /// Starts the current phase from its configured duration.
    ///
    /// Silently does nothing when already running or when the phase has no
    /// duration.
    pub async fn start(&self) -> TimerSnapshot {
        let started = {
            let mut state = self.ctx.state.lock().await;
            if state.start() {
                Some((state.phase, state.remaining_seconds))
            } else {
                None
            }
        };

        if let Some((phase, total_seconds)) = started {
            info!("starting {} phase: {}s", phase.as_str(), total_seconds);
            self.spawn_ticker().await;
            self.ctx.emit(TimerEvent::Started {
                phase,
                total_seconds,
                at: Utc::now(),
            });
        }

        self.get_snapshot().await
    }

    /// Pauses counting. Phase and remaining time are kept, but `start`
    /// reloads the full phase duration.
    pub async fn stop(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        let mut state = self.ctx.state.lock().await;
        state.stop();
        let snapshot = TimerSnapshot::from(&*state);

        self.ctx.emit(TimerEvent::Stopped {
            phase: snapshot.phase,
            remaining_seconds: snapshot.remaining_seconds,
            at: Utc::now(),
        });
        snapshot
    }

    pub async fn reset(&self) -> TimerSnapshot {
        self.cancel_ticker().await;
        let mut state = self.ctx.state.lock().await;
        state.reset();

        self.ctx.emit(TimerEvent::Reset { at: Utc::now() });
        TimerSnapshot::from(&*state)
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        // Replacing the slot drops (and cancels) any previous task.
        ticker_guard.take();

        let ctx = self.ctx.clone();
        let period = self.tick_interval;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match ctx.step().await {
                            TickOutcome::Counting { .. } => {}
                            TickOutcome::Advanced { running: true, .. } => interval.reset(),
                            _ => break,
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
            debug!("tick task exited");
        });

        *ticker_guard = Some(Ticker { handle, cancel });
    }

    async fn cancel_ticker(&self) {
        if self.ticker.lock().await.take().is_some() {
            debug!("tick task cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCue(AtomicUsize);

    impl CompletionCue for CountingCue {
        fn play_completion(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn timer() -> (IntervalTimer, SharedProgress, Arc<CountingCue>) {
        let progress: SharedProgress = Arc::new(Mutex::new(ProgressTracker::new()));
        let cue = Arc::new(CountingCue::default());
        let timer = IntervalTimer::new(progress.clone(), cue.clone());
        (timer, progress, cue)
    }

    async fn configure_secs(timer: &IntervalTimer, initial: u64, break_: u64, final_: u64) {
        timer
            .configure(TimerPhase::Initial, PhaseDuration::new(0, initial))
            .await;
        timer
            .configure(TimerPhase::Break, PhaseDuration::new(0, break_))
            .await;
        timer
            .configure(TimerPhase::Final, PhaseDuration::new(0, final_))
            .await;
    }

    async fn wait_secs(secs: f64) {
        time::sleep(Duration::from_secs_f64(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_finishes_after_ten_seconds() {
        let (timer, progress, cue) = timer();
        configure_secs(&timer, 5, 2, 3).await;

        let snapshot = timer.start().await;
        assert!(snapshot.is_running);
        assert_eq!(snapshot.remaining_seconds, 5);

        wait_secs(5.5).await;
        let snapshot = timer.get_snapshot().await;
        assert_eq!(snapshot.phase, TimerPhase::Break);
        assert_eq!(snapshot.remaining_seconds, 2);

        wait_secs(2.0).await;
        assert_eq!(timer.get_snapshot().await.phase, TimerPhase::Final);

        wait_secs(3.0).await;
        let snapshot = timer.get_snapshot().await;
        assert_eq!(snapshot.phase, TimerPhase::Finished);
        assert!(!snapshot.is_running);
        assert!(snapshot.timer_finished);

        assert_eq!(cue.0.load(Ordering::SeqCst), 1);
        // (5 + 3) * 0.15 + 2 * 0.1
        let progress = progress.lock().await;
        assert!((progress.experience() - 1.4).abs() < 1e-9);
        assert_eq!(progress.level(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_does_not_start() {
        let (timer, _, cue) = timer();
        timer
            .configure_from_input(TimerPhase::Initial, "abc", "")
            .await;

        let snapshot = timer.start().await;
        assert!(!snapshot.is_running);

        wait_secs(3.0).await;
        assert_eq!(timer.get_snapshot().await.phase, TimerPhase::Initial);
        assert_eq!(cue.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_ticks() {
        let (timer, _, _) = timer();
        configure_secs(&timer, 10, 1, 1).await;
        timer.start().await;

        wait_secs(3.5).await;
        let stopped = timer.stop().await;
        assert!(!stopped.is_running);
        assert_eq!(stopped.remaining_seconds, 7);

        wait_secs(5.0).await;
        assert_eq!(timer.get_snapshot().await, stopped);

        // Restarting reloads the full duration rather than resuming.
        let restarted = timer.start().await;
        assert_eq!(restarted.remaining_seconds, 10);
    }

    fn drain(events: &mut broadcast::Receiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn stop_racing_final_tick_never_loses_the_award() {
        let (timer, progress, cue) = timer();
        let mut events = timer.subscribe();
        configure_secs(&timer, 1, 1, 1).await;
        timer.start().await;

        // Into the last second of Final, then block the final tick on the
        // progress lock and stop while it waits.
        wait_secs(2.5).await;
        let guard = progress.lock().await;
        wait_secs(1.0).await;
        let stopped = timer.stop().await;
        drop(guard);
        wait_secs(2.0).await;

        let state = timer.get_state().await;
        let experience = progress.lock().await.experience();
        let finished_events = drain(&mut events)
            .into_iter()
            .filter(|event| matches!(event, TimerEvent::Finished { .. }))
            .count();

        assert_eq!(stopped.phase, TimerPhase::Final);
        assert!(!state.timer_finished);
        assert_eq!(state.phase, TimerPhase::Final);
        assert_eq!(experience, 0.0);
        assert_eq!(cue.0.load(Ordering::SeqCst), 0);
        assert_eq!(finished_events, 0);

        // Finishing properly afterwards awards exactly once.
        timer.start().await;
        wait_secs(1.5).await;
        let state = timer.get_state().await;
        assert!(state.timer_finished);
        assert!(progress.lock().await.experience() > 0.0);
        assert_eq!(cue.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_racing_final_tick_emits_nothing_after_reset() {
        let (timer, progress, cue) = timer();
        let mut events = timer.subscribe();
        configure_secs(&timer, 1, 1, 1).await;
        timer.start().await;

        wait_secs(2.5).await;
        let guard = progress.lock().await;
        wait_secs(1.0).await;
        timer.reset().await;
        drop(guard);
        wait_secs(2.0).await;

        let seen = drain(&mut events);
        let reset_at = seen
            .iter()
            .position(|event| matches!(event, TimerEvent::Reset { .. }))
            .expect("reset event published");
        assert_eq!(reset_at, seen.len() - 1);
        assert!(!seen
            .iter()
            .any(|event| matches!(event, TimerEvent::Finished { .. })));

        let state = timer.get_state().await;
        assert_eq!(state, TimerState::default());
        assert_eq!(progress.lock().await.experience(), 0.0);
        assert_eq!(cue.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_state_always_carries_its_award() {
        let (timer, progress, cue) = timer();
        let mut events = timer.subscribe();
        configure_secs(&timer, 1, 1, 1).await;
        timer.start().await;

        wait_secs(3.5).await;
        // Stopping after the finish must not undo anything.
        timer.stop().await;

        let state = timer.get_state().await;
        assert!(state.timer_finished);
        assert!((progress.lock().await.experience() - 0.4).abs() < 1e-9);
        assert_eq!(cue.0.load(Ordering::SeqCst), 1);
        assert!(drain(&mut events)
            .iter()
            .any(|event| matches!(event, TimerEvent::Finished { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_then_start_with_no_duration_stays_initial() {
        let (timer, _, _) = timer();
        configure_secs(&timer, 2, 2, 2).await;
        timer.start().await;
        wait_secs(1.5).await;

        let snapshot = timer.reset().await;
        assert_eq!(snapshot.phase, TimerPhase::Initial);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(!snapshot.is_running);
        assert!(!snapshot.timer_finished);

        timer.start().await;
        wait_secs(5.0).await;
        assert_eq!(timer.get_snapshot().await.phase, TimerPhase::Initial);
        assert_eq!(timer.get_state().await.durations, Default::default());
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_phase_events_in_order() {
        let (timer, progress, _) = timer();
        progress.lock().await.select_reward(RewardColor::Orange);
        let mut events = timer.subscribe();
        configure_secs(&timer, 1, 1, 1).await;

        timer.start().await;
        wait_secs(3.5).await;

        let seen = drain(&mut events);

        assert!(matches!(
            seen[0],
            TimerEvent::Started { phase: TimerPhase::Initial, total_seconds: 1, .. }
        ));
        assert!(matches!(
            seen[1],
            TimerEvent::PhaseAdvanced { from: TimerPhase::Initial, to: TimerPhase::Break, .. }
        ));
        assert!(matches!(
            seen[2],
            TimerEvent::PhaseAdvanced { from: TimerPhase::Break, to: TimerPhase::Final, .. }
        ));
        assert!(matches!(
            seen[3],
            TimerEvent::Finished { fill_color: RewardColor::Orange, .. }
        ));
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_the_task() {
        let (timer, progress, cue) = timer();
        configure_secs(&timer, 1, 0, 0).await;
        let state = timer.ctx.state.clone();

        timer.start().await;
        drop(timer);

        wait_secs(3.0).await;
        let state = state.lock().await;
        assert_eq!(state.phase, TimerPhase::Initial);
        assert_eq!(state.remaining_seconds, 1);
        assert_eq!(cue.0.load(Ordering::SeqCst), 0);
        assert_eq!(progress.lock().await.experience(), 0.0);
    }

    #[tokio::test]
    async fn tick_after_stop_is_ignored() {
        let (timer, _, cue) = timer();
        configure_secs(&timer, 1, 1, 1).await;
        timer.start().await;
        timer.stop().await;

        // Not running: a stray tick is ignored.
        assert_eq!(timer.ctx.step().await, TickOutcome::Idle);
        assert_eq!(cue.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fill_color_follows_completion() {
        let mut snapshot = TimerSnapshot::from(&TimerState::new());
        assert_eq!(snapshot.fill_color(Some(RewardColor::Red)), RewardColor::Black);

        snapshot.timer_finished = true;
        assert_eq!(snapshot.fill_color(Some(RewardColor::Red)), RewardColor::Red);
        assert_eq!(snapshot.fill_color(None), RewardColor::Green);
    }
}
