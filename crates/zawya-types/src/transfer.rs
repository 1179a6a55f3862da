//! Sending stickers to a friend.

use serde::Deserialize;
use std::collections::HashSet;

use crate::error::TransferError;
use crate::ledger::CollectionLedger;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferRequest {
    pub friend_id: String,
    pub sticker_ids: Vec<String>,
}

impl TransferRequest {
    /// Accepts only owned, distinct stickers of a single brand.
    /// Returns that brand.
    pub fn validate<'a>(&self, ledger: &'a CollectionLedger) -> Result<&'a str, TransferError> {
        if self.friend_id.trim().is_empty() {
            return Err(TransferError::MissingFriend);
        }
        if self.sticker_ids.is_empty() {
            return Err(TransferError::NothingSelected);
        }
        let mut seen = HashSet::with_capacity(self.sticker_ids.len());
        let mut brand: Option<&'a str> = None;
        for id in &self.sticker_ids {
            if !seen.insert(id.as_str()) {
                return Err(TransferError::Duplicate(id.clone()));
            }
            let sticker = ledger
                .get(id)
                .ok_or_else(|| TransferError::NotOwned(id.clone()))?;
            match brand {
                None => brand = Some(sticker.brand.as_str()),
                Some(b) if b != sticker.brand => return Err(TransferError::MixedBrands),
                Some(_) => {}
            }
        }
        brand.ok_or(TransferError::NothingSelected)
    }
}
