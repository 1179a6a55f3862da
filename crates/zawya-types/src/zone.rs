//! Geofenced collection zones.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(0xFF, 0x00, 0x00);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const MAGENTA: Rgb = Rgb::new(0xFF, 0x00, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A circular zone tied to a brand and a fixed sticker quota.
/// Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub center: Coordinate,
    /// Nominal radius (meters). Used for map hit-testing, never for scan gating.
    pub radius_m: f64,
    pub brand: String,
    pub quota: u32,
    pub color: Rgb,
}

impl Zone {
    pub fn new(
        id: impl Into<String>,
        center: Coordinate,
        radius_m: f64,
        brand: impl Into<String>,
        quota: u32,
        color: Rgb,
    ) -> Self {
        Self {
            id: id.into(),
            center,
            radius_m,
            brand: brand.into(),
            quota,
            color,
        }
    }

    /// True if `point` lies within the nominal radius.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.center.distance_to(point) <= self.radius_m
    }
}
