//! The album: which stickers have been collected, and how many remain per zone.
//!
//! Invariants upheld by every mutation:
//! - a sticker id appears at most once;
//! - the count collected in a zone never exceeds that zone's quota.
//!
//! Records are immutable once inserted. The outcome of the external mint is
//! tracked beside the record as a [`MintStatus`] and never retracts it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::ZoneCatalog;
use crate::error::CollectionError;
use crate::progress::BrandProgress;
use crate::rarity::StickerRarity;
use crate::zone::Zone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedSticker {
    pub sticker_id: String,
    pub zone_id: String,
    pub brand: String,
    pub rarity: StickerRarity,
    pub collected_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum MintStatus {
    Pending,
    Minted(String),
    Failed(String),
}

/// Single source of truth for sticker ownership within a session.
#[derive(Debug, Clone)]
pub struct CollectionLedger {
    catalog: Arc<ZoneCatalog>,
    stickers: HashMap<String, CollectedSticker>,
    /// Insertion order, for album display.
    order: Vec<String>,
    per_zone: HashMap<String, u32>,
    mints: HashMap<String, MintStatus>,
}

impl CollectionLedger {
    pub fn new(catalog: Arc<ZoneCatalog>) -> Self {
        Self {
            catalog,
            stickers: HashMap::new(),
            order: Vec::new(),
            per_zone: HashMap::new(),
            mints: HashMap::new(),
        }
    }

    /// Rebuild from persisted records, re-checking both invariants.
    /// Records without a mint status come back as [`MintStatus::Pending`].
    pub fn hydrate(
        catalog: Arc<ZoneCatalog>,
        records: impl IntoIterator<Item = (CollectedSticker, Option<MintStatus>)>,
    ) -> Result<Self, CollectionError> {
        let mut ledger = Self::new(catalog);
        for (sticker, status) in records {
            let zone = ledger.zone(&sticker.zone_id)?.clone();
            ledger.check_insertable(&sticker.sticker_id, &zone, &sticker.brand)?;
            let id = sticker.sticker_id.clone();
            ledger.insert(sticker);
            ledger
                .mints
                .insert(id, status.unwrap_or(MintStatus::Pending));
        }
        Ok(ledger)
    }

    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    pub fn has_sticker(&self, sticker_id: &str) -> bool {
        self.stickers.contains_key(sticker_id)
    }

    pub fn get(&self, sticker_id: &str) -> Option<&CollectedSticker> {
        self.stickers.get(sticker_id)
    }

    pub fn collected_in_zone(&self, zone_id: &str) -> u32 {
        self.per_zone.get(zone_id).copied().unwrap_or(0)
    }

    /// `quota - collected`. Zero for unknown zones.
    pub fn remaining_in_zone(&self, zone_id: &str) -> u32 {
        self.catalog
            .get(zone_id)
            .map(|z| z.quota.saturating_sub(self.collected_in_zone(zone_id)))
            .unwrap_or(0)
    }

    /// Check-then-insert as one step under `&mut self`.
    ///
    /// The new record starts with [`MintStatus::Pending`]; the caller is
    /// expected to dispatch the external mint afterwards.
    pub fn collect(
        &mut self,
        sticker_id: &str,
        zone_id: &str,
        brand: &str,
        now_ms: u64,
    ) -> Result<CollectedSticker, CollectionError> {
        if sticker_id.trim().is_empty() {
            return Err(CollectionError::InvalidInput("sticker id must not be empty".into()));
        }
        let zone = self.zone(zone_id)?.clone();
        self.check_insertable(sticker_id, &zone, brand)?;

        let sticker = CollectedSticker {
            sticker_id: sticker_id.to_string(),
            zone_id: zone.id.clone(),
            brand: zone.brand.clone(),
            rarity: StickerRarity::for_quota(zone.quota),
            collected_at_ms: now_ms,
        };
        self.insert(sticker.clone());
        self.mints
            .insert(sticker_id.to_string(), MintStatus::Pending);
        Ok(sticker)
    }

    pub fn mint_status(&self, sticker_id: &str) -> Option<&MintStatus> {
        self.mints.get(sticker_id)
    }

    /// External token reference, once the mint has resolved successfully.
    pub fn token_ref(&self, sticker_id: &str) -> Option<&str> {
        match self.mints.get(sticker_id) {
            Some(MintStatus::Minted(token)) => Some(token.as_str()),
            _ => None,
        }
    }

    /// Record a successful mint. Returns false for stickers not in the album.
    pub fn mark_minted(&mut self, sticker_id: &str, token_ref: impl Into<String>) -> bool {
        self.set_mint_status(sticker_id, MintStatus::Minted(token_ref.into()))
    }

    /// Record a failed mint. The album entry stays.
    pub fn mark_mint_failed(&mut self, sticker_id: &str, reason: impl Into<String>) -> bool {
        self.set_mint_status(sticker_id, MintStatus::Failed(reason.into()))
    }

    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }

    /// Stickers in collection order.
    pub fn stickers(&self) -> impl Iterator<Item = &CollectedSticker> {
        self.order.iter().filter_map(|id| self.stickers.get(id))
    }

    /// Album entries of one brand, in collection order.
    pub fn stickers_for_brand<'a>(
        &'a self,
        brand: &'a str,
    ) -> impl Iterator<Item = &'a CollectedSticker> + 'a {
        self.stickers().filter(move |s| s.brand == brand)
    }

    pub fn brand_progress(&self) -> Vec<BrandProgress> {
        self.catalog
            .brands()
            .into_iter()
            .map(|brand| BrandProgress {
                brand: brand.to_string(),
                collected: self
                    .catalog
                    .zones_for_brand(brand)
                    .map(|z| self.collected_in_zone(&z.id))
                    .sum(),
                total: self.catalog.total_quota_for_brand(brand),
            })
            .collect()
    }

    /// Brand zones that still have stickers to find.
    pub fn available_zones_for_brand<'a>(&'a self, brand: &'a str) -> Vec<&'a Zone> {
        self.catalog
            .zones_for_brand(brand)
            .filter(|z| self.remaining_in_zone(&z.id) > 0)
            .collect()
    }

    fn zone(&self, zone_id: &str) -> Result<&Zone, CollectionError> {
        self.catalog
            .get(zone_id)
            .ok_or_else(|| CollectionError::UnknownZone(zone_id.to_string()))
    }

    fn check_insertable(
        &self,
        sticker_id: &str,
        zone: &Zone,
        brand: &str,
    ) -> Result<(), CollectionError> {
        if self.has_sticker(sticker_id) {
            return Err(CollectionError::AlreadyOwned(sticker_id.to_string()));
        }
        if zone.brand != brand {
            return Err(CollectionError::BrandMismatch {
                zone_id: zone.id.clone(),
                expected: zone.brand.clone(),
                got: brand.to_string(),
            });
        }
        if self.remaining_in_zone(&zone.id) == 0 {
            return Err(CollectionError::ZoneExhausted(zone.id.clone()));
        }
        Ok(())
    }

    fn insert(&mut self, sticker: CollectedSticker) {
        *self.per_zone.entry(sticker.zone_id.clone()).or_insert(0) += 1;
        self.order.push(sticker.sticker_id.clone());
        self.stickers.insert(sticker.sticker_id.clone(), sticker);
    }

    fn set_mint_status(&mut self, sticker_id: &str, status: MintStatus) -> bool {
        if !self.has_sticker(sticker_id) {
            return false;
        }
        self.mints.insert(sticker_id.to_string(), status);
        true
    }
}
