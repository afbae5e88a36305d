use std::{sync::Arc, time::Duration};

use log::info;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    audio::CompletionCue,
    progress::{ProgressSnapshot, ProgressTracker},
    rewards::{Inventory, Reward, RewardColor, RewardDispenser},
    timer::{IntervalTimer, SharedProgress},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    pub reward: Option<Reward>,
}

impl SpinOutcome {
    /// Text for the acquired-color alert.
    pub fn message(&self) -> &str {
        self.reward
            .as_ref()
            .map(|reward| reward.name.as_str())
            .unwrap_or("No color acquired")
    }
}

/// App-lifetime context: the loot box, the inventory and the player's progress.
///
/// Timers opened from here share the progress tracker so a finished session
/// can award experience.
pub struct AppSession {
    dispenser: RewardDispenser,
    inventory: Inventory,
    progress: SharedProgress,
    cue: Arc<dyn CompletionCue>,
    tick_interval: Duration,
}

impl AppSession {
    pub fn new(dispenser: RewardDispenser, cue: Arc<dyn CompletionCue>) -> Self {
        Self {
            dispenser,
            inventory: Inventory::new(),
            progress: Arc::new(Mutex::new(ProgressTracker::new())),
            cue,
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub async fn progress(&self) -> ProgressSnapshot {
        self.progress.lock().await.snapshot()
    }

    /// Draws from the loot box and keeps whatever comes out.
    pub fn spin(&mut self) -> SpinOutcome {
        let reward = self.dispenser.draw_reward(self.inventory.rewards());
        if let Some(reward) = &reward {
            info!("acquired {}", reward.name);
            self.inventory.acquire(reward.clone());
        }
        SpinOutcome { reward }
    }

    pub async fn select_reward(&self, color: RewardColor) {
        self.progress.lock().await.select_reward(color);
    }

    /// Opens a timer screen.
    ///
    /// The selected color is moved to the front of the inventory. The
    /// returned timer is owned by the caller; dropping it cancels its ticks.
    pub async fn open_timer(&mut self) -> IntervalTimer {
        if let Some(color) = self.progress.lock().await.selected_color() {
            self.inventory.promote(color);
        }
        IntervalTimer::new(self.progress.clone(), self.cue.clone())
            .with_tick_interval(self.tick_interval)
    }
}
