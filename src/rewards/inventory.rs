use serde::Serialize;

use super::catalog::{Reward, RewardColor};

/// Acquired rewards, most recently acquired first.
///
/// Colors are only kept unique by the dispenser; `promote` may re-insert one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Inventory {
    rewards: Vec<Reward>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn contains(&self, color: RewardColor) -> bool {
        self.rewards.iter().any(|reward| reward.color == color)
    }

    pub fn acquire(&mut self, reward: Reward) {
        self.rewards.insert(0, reward);
    }

    /// Moves `color` to the front as the active reward.
    ///
    /// Every entry of that color is dropped and an unnamed entry takes its
    /// place, matching what the timer screen shows for the active color.
    pub fn promote(&mut self, color: RewardColor) {
        self.rewards.retain(|reward| reward.color != color);
        self.rewards.insert(0, Reward::new(color, ""));
    }
}
