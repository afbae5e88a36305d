use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::catalog::{Reward, RewardColor, CATALOG};

/// The loot box: hands out catalog colors the player does not own yet.
pub struct RewardDispenser {
    rng: StdRng,
}

impl RewardDispenser {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Catalog colors not present in `owned`, in catalog order.
    pub fn candidates(owned: &[Reward]) -> Vec<RewardColor> {
        CATALOG
            .iter()
            .copied()
            .filter(|color| !owned.iter().any(|reward| reward.color == *color))
            .collect()
    }

    /// Draws one unowned color uniformly at random.
    ///
    /// Returns `None` once every catalog color is owned. Inserting the result
    /// into the inventory is the caller's job.
    pub fn draw_reward(&mut self, owned: &[Reward]) -> Option<Reward> {
        let candidates = Self::candidates(owned);
        let color = candidates.choose(&mut self.rng).copied();
        if color.is_none() {
            debug!("loot box empty: all {} colors owned", CATALOG.len());
        }
        color.map(Reward::from_catalog)
    }
}

impl Default for RewardDispenser {
    fn default() -> Self {
        Self::new()
    }
}
