//! Static registry of collection zones.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::geo::Coordinate;
use crate::zone::{Rgb, Zone};

/// South-west / north-east corners of the playable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south_west.latitude..=self.north_east.latitude).contains(&point.latitude)
            && (self.south_west.longitude..=self.north_east.longitude).contains(&point.longitude)
    }
}

/// Immutable zone registry, built once at startup.
#[derive(Debug, Clone)]
pub struct ZoneCatalog {
    zones: Vec<Zone>,
    center: Coordinate,
    bounds: Bounds,
}

impl ZoneCatalog {
    /// Build a catalog, rejecting duplicate or empty ids, zero quotas, and bad geometry.
    pub fn new(zones: Vec<Zone>, center: Coordinate, bounds: Bounds) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(zones.len());
        for zone in &zones {
            if zone.id.is_empty() {
                return Err(CatalogError::Invalid("zone id must not be empty".into()));
            }
            if !seen.insert(zone.id.as_str()) {
                return Err(CatalogError::DuplicateZone(zone.id.clone()));
            }
            if zone.quota == 0 {
                return Err(CatalogError::Invalid(format!(
                    "zone {} has a zero sticker quota",
                    zone.id
                )));
            }
            if !zone.center.is_valid() || !zone.radius_m.is_finite() || zone.radius_m <= 0.0 {
                return Err(CatalogError::Invalid(format!(
                    "zone {} has invalid geometry",
                    zone.id
                )));
            }
        }
        Ok(Self {
            zones,
            center,
            bounds,
        })
    }

    /// The Lausanne launch catalog: three brands over nine zones.
    pub fn lausanne() -> Self {
        let at = Coordinate::new;
        let zones = vec![
            Zone::new("mcdo_1", at(46.5197, 6.6323), 150.0, "McDonald's", 3, Rgb::RED),
            Zone::new("mcdo_2", at(46.5250, 6.6280), 120.0, "McDonald's", 2, Rgb::RED),
            Zone::new("nike_1", at(46.5220, 6.6350), 180.0, "Nike", 4, Rgb::BLACK),
            Zone::new("nike_2", at(46.5180, 6.6250), 160.0, "Nike", 3, Rgb::BLACK),
            Zone::new("nike_3", at(46.5280, 6.6400), 140.0, "Nike", 3, Rgb::BLACK),
            Zone::new("sephora_1", at(46.5200, 6.6300), 200.0, "Sephora", 4, Rgb::MAGENTA),
            Zone::new("sephora_2", at(46.5150, 6.6200), 170.0, "Sephora", 4, Rgb::MAGENTA),
            Zone::new("sephora_3", at(46.5250, 6.6450), 160.0, "Sephora", 4, Rgb::MAGENTA),
            Zone::new("sephora_4", at(46.5300, 6.6350), 150.0, "Sephora", 3, Rgb::MAGENTA),
        ];
        let bounds = Bounds {
            south_west: Coordinate::new(46.5100, 6.6150),
            north_east: Coordinate::new(46.5350, 6.6500),
        };
        Self {
            zones,
            center: Coordinate::new(46.5197, 6.6323),
            bounds,
        }
    }

    pub fn list_zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn get(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == zone_id)
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Distinct brands in catalog order.
    pub fn brands(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for zone in &self.zones {
            if !out.contains(&zone.brand.as_str()) {
                out.push(&zone.brand);
            }
        }
        out
    }

    pub fn zones_for_brand<'a>(&'a self, brand: &'a str) -> impl Iterator<Item = &'a Zone> + 'a {
        self.zones.iter().filter(move |z| z.brand == brand)
    }

    pub fn total_quota_for_brand(&self, brand: &str) -> u32 {
        self.zones_for_brand(brand).map(|z| z.quota).sum()
    }

    /// Map hit-test against nominal radii. First match in catalog order wins.
    pub fn zone_at(&self, point: &Coordinate) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(point))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        ZoneCatalog::lausanne().bounds()
    }

    #[test]
    fn test_lausanne_catalog_shape() {
        let catalog = ZoneCatalog::lausanne();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.brands(), vec!["McDonald's", "Nike", "Sephora"]);
        assert_eq!(catalog.total_quota_for_brand("McDonald's"), 5);
        assert_eq!(catalog.total_quota_for_brand("Nike"), 10);
        assert_eq!(catalog.total_quota_for_brand("Sephora"), 15);
    }

    #[test]
    fn test_lausanne_catalog_passes_validation() {
        let base = ZoneCatalog::lausanne();
        let rebuilt = ZoneCatalog::new(base.list_zones().to_vec(), base.center(), base.bounds());
        assert!(rebuilt.is_ok());
    }

    #[test]
    fn test_zones_inside_bounds() {
        let catalog = ZoneCatalog::lausanne();
        for zone in catalog.list_zones() {
            assert!(catalog.bounds().contains(&zone.center), "{} out of bounds", zone.id);
        }
    }

    #[test]
    fn test_get() {
        let catalog = ZoneCatalog::lausanne();
        assert_eq!(catalog.get("nike_2").unwrap().quota, 3);
        assert!(catalog.get("adidas_1").is_none());
    }

    #[test]
    fn test_zone_at_uses_nominal_radius() {
        let catalog = ZoneCatalog::lausanne();
        let sephora_2 = catalog.get("sephora_2").unwrap();
        let hit = catalog.zone_at(&sephora_2.center).unwrap();
        assert_eq!(hit.id, "sephora_2");
        assert!(catalog.zone_at(&Coordinate::new(46.60, 6.70)).is_none());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let z = Zone::new("a", Coordinate::new(0.0, 0.0), 10.0, "B", 1, Rgb::RED);
        let err = ZoneCatalog::new(vec![z.clone(), z], Coordinate::new(0.0, 0.0), bounds())
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateZone(id) if id == "a"));
    }

    #[test]
    fn test_rejects_zero_quota_and_bad_geometry() {
        let center = Coordinate::new(0.0, 0.0);
        let zero = Zone::new("a", center, 10.0, "B", 0, Rgb::RED);
        assert!(ZoneCatalog::new(vec![zero], center, bounds()).is_err());

        let bad = Zone::new("a", Coordinate::new(f64::NAN, 0.0), 10.0, "B", 1, Rgb::RED);
        assert!(ZoneCatalog::new(vec![bad], center, bounds()).is_err());

        let empty = Zone::new("", center, 10.0, "B", 1, Rgb::RED);
        assert!(ZoneCatalog::new(vec![empty], center, bounds()).is_err());
    }
}
