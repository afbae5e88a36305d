pub mod catalog;
pub mod dispenser;
pub mod inventory;

pub use catalog::{Reward, RewardColor, CATALOG};
pub use dispenser::RewardDispenser;
pub use inventory::Inventory;
