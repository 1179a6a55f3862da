//! Proximity gate: may the user scan a zone's sticker from where they stand?
//!
//! Gating uses a single scan radius around the zone center, independent of
//! the zone's nominal (map) radius and of any projected overlay radius.

use serde::Serialize;

use crate::geo::{Coordinate, distance_m};
use crate::zone::Zone;

/// Canonical scan radius (meters).
pub const SCAN_RADIUS_METERS: f64 = 20.0;

/// Inside this distance the scan affordance switches to its "very close" label.
pub const NEAR_TIER_METERS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanTier {
    Far,
    Near,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenyReason {
    NoLocation,
    TooFar { distance_m: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanPermission {
    Allowed { tier: ScanTier, distance_m: f64 },
    Denied(DenyReason),
}

impl ScanPermission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Distance to the zone center, when a location was known.
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            Self::Allowed { distance_m, .. } => Some(*distance_m),
            Self::Denied(DenyReason::TooFar { distance_m }) => Some(*distance_m),
            Self::Denied(DenyReason::NoLocation) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityGate {
    scan_radius_m: f64,
    near_radius_m: f64,
}

impl Default for ProximityGate {
    fn default() -> Self {
        Self {
            scan_radius_m: SCAN_RADIUS_METERS,
            near_radius_m: NEAR_TIER_METERS,
        }
    }
}

impl ProximityGate {
    /// Requires `0 < near_radius_m <= scan_radius_m`.
    pub fn new(scan_radius_m: f64, near_radius_m: f64) -> Option<Self> {
        let valid = scan_radius_m.is_finite()
            && near_radius_m.is_finite()
            && near_radius_m > 0.0
            && near_radius_m <= scan_radius_m;
        valid.then_some(Self {
            scan_radius_m,
            near_radius_m,
        })
    }

    pub fn scan_radius_m(&self) -> f64 {
        self.scan_radius_m
    }

    pub fn near_radius_m(&self) -> f64 {
        self.near_radius_m
    }

    /// Pure and unlatched: call again on every location update.
    pub fn can_scan(&self, user: Option<&Coordinate>, zone: &Zone) -> ScanPermission {
        let Some(user) = user else {
            return ScanPermission::Denied(DenyReason::NoLocation);
        };
        let d = distance_m(user, &zone.center);
        if d <= self.scan_radius_m {
            let tier = if d <= self.near_radius_m {
                ScanTier::Near
            } else {
                ScanTier::Far
            };
            ScanPermission::Allowed {
                tier,
                distance_m: d,
            }
        } else {
            ScanPermission::Denied(DenyReason::TooFar { distance_m: d })
        }
    }
}
