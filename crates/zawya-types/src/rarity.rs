//! Inverted-scarcity rarity tiers: the smaller a zone's quota, the rarer its stickers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickerRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl StickerRarity {
    pub fn for_quota(quota: u32) -> Self {
        match quota {
            0..=5 => Self::Legendary,
            6..=10 => Self::Epic,
            11..=20 => Self::Rare,
            _ => Self::Common,
        }
    }
}
