use serde::Serialize;

/// Collected vs. total stickers for one brand across all its zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandProgress {
    pub brand: String,
    pub collected: u32,
    pub total: u32,
}

impl BrandProgress {
    /// Whole percent, rounded down. Zero when the brand has no stickers.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((u64::from(self.collected) * 100) / u64::from(self.total)) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.total
    }
}
