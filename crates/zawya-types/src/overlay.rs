//! Presentation-only zone projection.
//!
//! Circles shrink as the user closes in so the map points at the sticker.
//! Nothing here is authoritative: scan permission comes from
//! [`ProximityGate`] and the zone's real center, never from a projected radius.

use serde::Serialize;

use crate::gate::ProximityGate;
use crate::geo::{Coordinate, distance_m};
use crate::zone::Zone;

/// Visual radius at or below which a circle is drawn emphasized.
const EMPHASIS_RADIUS_M: f64 = 20.0;

const NEAR_PHASE_M: f64 = 50.0;
const APPROACHING_PHASE_M: f64 = 200.0;

/// Visual radius for a zone given the user's distance to its center.
/// Without a distance the nominal radius is kept.
pub fn visual_radius_m(nominal_m: f64, distance: Option<f64>) -> f64 {
    let Some(d) = distance else {
        return nominal_m;
    };
    match d {
        d if d <= 10.0 => 5.0,
        d if d <= 25.0 => 10.0,
        d if d <= 50.0 => 20.0,
        d if d <= 100.0 => nominal_m * 0.5,
        d if d <= 200.0 => nominal_m * 0.7,
        _ => nominal_m,
    }
}

/// Alpha channels and stroke for drawing a projected zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlayStyle {
    pub fill_alpha: u8,
    pub stroke_alpha: u8,
    pub stroke_width: u8,
}

impl OverlayStyle {
    fn for_zone(quota: u32, emphasized: bool) -> Self {
        if emphasized {
            return Self {
                fill_alpha: 220,
                stroke_alpha: 255,
                stroke_width: 5,
            };
        }
        let (fill_alpha, stroke_alpha) = match quota {
            0..=5 => (100, 200),
            6..=15 => (150, 255),
            _ => (200, 255),
        };
        Self {
            fill_alpha,
            stroke_alpha,
            stroke_width: 3,
        }
    }
}

/// A zone as the map should draw it. The nominal zone is borrowed untouched.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedZone<'a> {
    pub zone: &'a Zone,
    pub distance_m: Option<f64>,
    pub visual_radius_m: f64,
    pub emphasized: bool,
    pub style: OverlayStyle,
}

pub fn project<'a>(zones: &'a [Zone], user: Option<&Coordinate>) -> Vec<ProjectedZone<'a>> {
    zones
        .iter()
        .map(|zone| {
            let distance = user.map(|u| distance_m(u, &zone.center));
            let visual = visual_radius_m(zone.radius_m, distance);
            let emphasized = visual <= EMPHASIS_RADIUS_M;
            ProjectedZone {
                zone,
                distance_m: distance,
                visual_radius_m: visual,
                emphasized,
                style: OverlayStyle::for_zone(zone.quota, emphasized),
            }
        })
        .collect()
}

/// Per-zone progression as the user walks in. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZonePhase {
    Far,
    Approaching,
    Near,
    Scannable,
}

pub fn observe_phase(gate: &ProximityGate, zone: &Zone, user: Option<&Coordinate>) -> ZonePhase {
    let Some(user) = user else {
        return ZonePhase::Far;
    };
    if gate.can_scan(Some(user), zone).is_allowed() {
        return ZonePhase::Scannable;
    }
    let d = distance_m(user, &zone.center);
    if d <= NEAR_PHASE_M {
        ZonePhase::Near
    } else if d <= APPROACHING_PHASE_M {
        ZonePhase::Approaching
    } else {
        ZonePhase::Far
    }
}
