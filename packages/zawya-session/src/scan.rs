//! Sticker QR payloads.
//!
//! Format: a JSON object
//! `{"sticker_id", "zone_id", "brand_name", "timestamp"?, "signature"?, "version"?}`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const PAYLOAD_VERSION: &str = "1.0";

/// A validated claim handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerClaim {
    pub sticker_id: String,
    pub zone_id: String,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    Malformed(String),
    MissingFields,
    InvalidSignature,
    Expired,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Malformed(msg) => write!(f, "invalid QR code format: {msg}"),
            ScanError::MissingFields => write!(f, "missing required fields"),
            ScanError::InvalidSignature => write!(f, "invalid signature"),
            ScanError::Expired => write!(f, "QR code expired"),
        }
    }
}

impl std::error::Error for ScanError {}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    sticker_id: String,
    #[serde(default)]
    zone_id: String,
    #[serde(default)]
    brand_name: String,
    #[serde(default)]
    signature: String,
    #[serde(default)]
    timestamp: u64,
}

#[derive(Serialize)]
struct OutgoingPayload<'a> {
    sticker_id: &'a str,
    zone_id: &'a str,
    brand_name: &'a str,
    timestamp: u64,
    version: &'static str,
}

/// Parse and validate a scanned payload.
pub fn parse_payload(
    text: &str,
    now_ms: u64,
    max_age: Duration,
) -> Result<StickerClaim, ScanError> {
    let raw: RawPayload =
        serde_json::from_str(text.trim()).map_err(|e| ScanError::Malformed(e.to_string()))?;

    if raw.sticker_id.is_empty() || raw.zone_id.is_empty() || raw.brand_name.is_empty() {
        return Err(ScanError::MissingFields);
    }
    if !raw.signature.is_empty() && !signature_valid(text, &raw.signature) {
        return Err(ScanError::InvalidSignature);
    }
    let max_age_ms = u64::try_from(max_age.as_millis()).unwrap_or(u64::MAX);
    // Zero means the sticker carries no timestamp.
    if raw.timestamp > 0 && now_ms.saturating_sub(raw.timestamp) > max_age_ms {
        return Err(ScanError::Expired);
    }

    Ok(StickerClaim {
        sticker_id: raw.sticker_id,
        zone_id: raw.zone_id,
        brand_name: raw.brand_name,
    })
}

/// Signatures are not verified yet: stickers are printed without a signing key.
fn signature_valid(_payload: &str, _signature: &str) -> bool {
    true
}

/// `sticker_` + 16 hex chars of SHA-256 over zone, brand, time, and randomness.
pub fn generate_sticker_id(zone_id: &str, brand_name: &str) -> String {
    let nonce: u128 = rand::thread_rng().gen();
    let data = format!("{zone_id}:{brand_name}:{}:{nonce:032x}", now_ms());
    let digest = Sha256::digest(data.as_bytes());
    format!("sticker_{}", &hex::encode(digest)[..16])
}

/// Payload text for printing a new sticker.
pub fn create_payload(zone_id: &str, brand_name: &str) -> String {
    let sticker_id = generate_sticker_id(zone_id, brand_name);
    let payload = OutgoingPayload {
        sticker_id: &sticker_id,
        zone_id,
        brand_name,
        timestamp: now_ms(),
        version: PAYLOAD_VERSION,
    };
    serde_json::to_string(&payload).unwrap_or_default()
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
