use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RewardColor {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
    Pink,
    Gray,
    Brown,
    Black,
}

impl RewardColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardColor::Red => "Red",
            RewardColor::Blue => "Blue",
            RewardColor::Green => "Green",
            RewardColor::Yellow => "Yellow",
            RewardColor::Orange => "Orange",
            RewardColor::Purple => "Purple",
            RewardColor::Pink => "Pink",
            RewardColor::Gray => "Gray",
            RewardColor::Brown => "Brown",
            RewardColor::Black => "Black",
        }
    }

    /// sRGB components used when filling the finished-timer background.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            RewardColor::Red => (255, 59, 48),
            RewardColor::Blue => (0, 122, 255),
            RewardColor::Green => (52, 199, 89),
            RewardColor::Yellow => (255, 204, 0),
            RewardColor::Orange => (255, 149, 0),
            RewardColor::Purple => (175, 82, 222),
            RewardColor::Pink => (255, 45, 85),
            RewardColor::Gray => (142, 142, 147),
            RewardColor::Brown => (162, 132, 94),
            RewardColor::Black => (0, 0, 0),
        }
    }
}

/// Fixed catalog order. Draws are uniform, so the order only matters for display.
pub const CATALOG: [RewardColor; 10] = [
    RewardColor::Red,
    RewardColor::Blue,
    RewardColor::Green,
    RewardColor::Yellow,
    RewardColor::Orange,
    RewardColor::Purple,
    RewardColor::Pink,
    RewardColor::Gray,
    RewardColor::Brown,
    RewardColor::Black,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    pub color: RewardColor,
    pub name: String,
}

impl Reward {
    pub fn new(color: RewardColor, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            color,
            name: name.into(),
        }
    }

    /// A fresh catalog entry for `color`, named after it.
    pub fn from_catalog(color: RewardColor) -> Self {
        Self::new(color, color.as_str())
    }
}
