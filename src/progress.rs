use log::{info, warn};
use serde::Serialize;

use crate::rewards::RewardColor;

/// Experience needed per level step.
const EXPERIENCE_PER_LEVEL: f64 = 20.0;

/// Experience required to leave `level`. Linear and uncapped.
pub fn required_experience(level: u32) -> f64 {
    f64::from(level) * EXPERIENCE_PER_LEVEL
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub selected_color: Option<RewardColor>,
    pub experience: f64,
    pub level: u32,
    pub level_progress: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTracker {
    selected_color: Option<RewardColor>,
    experience: f64,
    level: u32,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            selected_color: None,
            experience: 0.0,
            level: 1,
        }
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn experience(&self) -> f64 {
        self.experience
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn selected_color(&self) -> Option<RewardColor> {
        self.selected_color
    }

    /// Fill ratio of the profile experience bar.
    ///
    /// Experience is cumulative, so this can exceed 1.0.
    pub fn level_progress(&self) -> f64 {
        self.experience / required_experience(self.level)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            selected_color: self.selected_color,
            experience: self.experience,
            level: self.level,
            level_progress: self.level_progress(),
        }
    }

    /// No check that the color is actually owned.
    pub fn select_reward(&mut self, color: RewardColor) {
        self.selected_color = Some(color);
    }

    pub fn add_experience(&mut self, amount: f64) {
        if !amount.is_finite() || amount < 0.0 {
            warn!("ignoring invalid experience amount {amount}");
            return;
        }
        self.experience += amount;
        self.check_level_up();
    }

    /// Raises the level by at most one step per call.
    ///
    /// Experience is not consumed, and crossing several thresholds at once
    /// still yields a single level.
    pub fn check_level_up(&mut self) {
        if self.experience >= required_experience(self.level) {
            self.level += 1;
            info!(
                "level up: now level {} ({:.2} xp)",
                self.level, self.experience
            );
        }
    }
}
