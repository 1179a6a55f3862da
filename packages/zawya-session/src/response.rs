//! Request and response bodies for the session API.

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub zones: usize,
    pub album: usize,
    pub pending_mints: usize,
    pub mint_mode: &'static str,
    pub uptime_secs: u64,
    pub requests: u64,
}

#[derive(Debug, Deserialize)]
pub struct LocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct PermissionUpdate {
    pub granted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlbumQuery {
    pub brand: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Raw text decoded from the QR code.
    pub payload: String,
}

#[derive(Serialize)]
pub struct AckResponse {
    pub success: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Serialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferResponse {
    pub fn ok(tx_ref: String) -> Self {
        Self {
            success: true,
            tx_ref: Some(tx_ref),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_ref: None,
            error: Some(error.into()),
        }
    }
}
