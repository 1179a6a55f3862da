//! Session configuration.

use serde::Deserialize;
use std::time::Duration;
use zawya_types::{Coordinate, ProximityGate};

/// Top-level configuration, loaded from `zawya.toml` and `ZAWYA_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Canonical scan radius (meters). One value for every scan entry point.
    #[serde(default = "defaults::scan_radius_m")]
    pub scan_radius_m: f64,

    #[serde(default = "defaults::near_radius_m")]
    pub near_radius_m: f64,

    #[serde(default = "defaults::location_timeout_ms")]
    pub location_timeout_ms: u64,

    #[serde(default = "defaults::location_attempts")]
    pub location_attempts: u32,

    #[serde(default = "defaults::max_fix_age_secs")]
    pub max_fix_age_secs: u64,

    #[serde(default = "defaults::fallback_latitude")]
    pub fallback_latitude: f64,

    #[serde(default = "defaults::fallback_longitude")]
    pub fallback_longitude: f64,

    #[serde(default = "defaults::qr_max_age_days")]
    pub qr_max_age_days: u64,

    #[serde(default = "defaults::command_buffer")]
    pub command_buffer: usize,

    /// Album snapshot path. Empty disables persistence.
    #[serde(default = "defaults::album_path")]
    pub album_path: String,

    #[serde(default)]
    pub mint: MintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MintMode {
    /// No external mint; album entries stay local.
    Disabled,
    /// Mint through the JSON-RPC relay.
    Rpc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MintConfig {
    #[serde(default = "defaults::mint_mode")]
    pub mode: MintMode,

    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    #[serde(default = "defaults::fallback_rpc_url")]
    pub fallback_rpc_url: String,

    #[serde(default)]
    pub package_id: String,

    #[serde(default)]
    pub registry_id: String,

    #[serde(default = "defaults::poll_attempts")]
    pub poll_attempts: u32,

    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            scan_radius_m: defaults::scan_radius_m(),
            near_radius_m: defaults::near_radius_m(),
            location_timeout_ms: defaults::location_timeout_ms(),
            location_attempts: defaults::location_attempts(),
            max_fix_age_secs: defaults::max_fix_age_secs(),
            fallback_latitude: defaults::fallback_latitude(),
            fallback_longitude: defaults::fallback_longitude(),
            qr_max_age_days: defaults::qr_max_age_days(),
            command_buffer: defaults::command_buffer(),
            album_path: defaults::album_path(),
            mint: MintConfig::default(),
        }
    }
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            mode: defaults::mint_mode(),
            rpc_url: defaults::rpc_url(),
            fallback_rpc_url: defaults::fallback_rpc_url(),
            package_id: String::new(),
            registry_id: String::new(),
            poll_attempts: defaults::poll_attempts(),
            poll_interval_ms: defaults::poll_interval_ms(),
            timeout_ms: defaults::timeout_ms(),
        }
    }
}

impl Config {
    /// Load from `zawya.toml` (optional) and `ZAWYA_` env vars (`__` separates nesting).
    pub fn load() -> Result<Self, crate::Error> {
        config::Config::builder()
            .add_source(config::File::with_name("zawya").required(false))
            .add_source(
                config::Environment::with_prefix("ZAWYA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Config>())
            .map_err(|e| crate::Error::Config(e.to_string()))
            .and_then(|c| c.validate().map(|_| c))
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        self.gate()?;
        if self.command_buffer == 0 {
            return Err(crate::Error::Config("command_buffer must be > 0".into()));
        }
        if self.location_attempts == 0 {
            return Err(crate::Error::Config("location_attempts must be > 0".into()));
        }
        if !self.fallback_location().is_valid() {
            return Err(crate::Error::Config("fallback location out of range".into()));
        }
        if self.mint.mode == MintMode::Rpc && self.mint.package_id.is_empty() {
            return Err(crate::Error::Config(
                "mint.package_id is required when mint.mode = rpc".into(),
            ));
        }
        Ok(())
    }

    pub fn gate(&self) -> Result<ProximityGate, crate::Error> {
        ProximityGate::new(self.scan_radius_m, self.near_radius_m).ok_or_else(|| {
            crate::Error::Config(format!(
                "invalid scan radii: scan={} near={} (need 0 < near <= scan)",
                self.scan_radius_m, self.near_radius_m
            ))
        })
    }

    pub fn fallback_location(&self) -> Coordinate {
        Coordinate::new(self.fallback_latitude, self.fallback_longitude)
    }

    pub fn location_policy(&self) -> crate::location::LocationPolicy {
        crate::location::LocationPolicy {
            attempts: self.location_attempts,
            timeout: Duration::from_millis(self.location_timeout_ms),
            max_fix_age: Duration::from_secs(self.max_fix_age_secs),
            fallback: self.fallback_location(),
        }
    }

    pub fn qr_max_age(&self) -> Duration {
        Duration::from_secs(self.qr_max_age_days.saturating_mul(24 * 60 * 60))
    }
}

mod defaults {
    use super::MintMode;

    pub fn bind_address() -> String {
        "0.0.0.0:3050".into()
    }

    pub fn scan_radius_m() -> f64 {
        zawya_types::SCAN_RADIUS_METERS
    }

    pub fn near_radius_m() -> f64 {
        zawya_types::NEAR_TIER_METERS
    }

    pub fn location_timeout_ms() -> u64 {
        3_000
    }

    pub fn location_attempts() -> u32 {
        2
    }

    pub fn max_fix_age_secs() -> u64 {
        30
    }

    /// Lausanne, Flon.
    pub fn fallback_latitude() -> f64 {
        46.5250
    }

    pub fn fallback_longitude() -> f64 {
        6.6280
    }

    pub fn qr_max_age_days() -> u64 {
        30
    }

    pub fn command_buffer() -> usize {
        64
    }

    pub fn album_path() -> String {
        "./data/album.json".into()
    }

    pub fn mint_mode() -> MintMode {
        MintMode::Disabled
    }

    pub fn rpc_url() -> String {
        if let Ok(url) = std::env::var("ZAWYA_RPC_URL") {
            if !url.is_empty() {
                return url;
            }
        }
        "https://fullnode.testnet.sui.io:443".into()
    }

    pub fn fallback_rpc_url() -> String {
        "https://sui-testnet-rpc.publicnode.com".into()
    }

    pub fn poll_attempts() -> u32 {
        5
    }

    pub fn poll_interval_ms() -> u64 {
        1_000
    }

    pub fn timeout_ms() -> u64 {
        10_000
    }
}
