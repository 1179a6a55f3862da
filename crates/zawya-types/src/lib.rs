//! Pure-logic core of the Zawya sticker hunt.
//! No async, no I/O: usable from the session actor, tests, and tooling alike.

mod catalog;
mod error;
mod gate;
mod geo;
mod ledger;
mod overlay;
mod progress;
mod rarity;
mod transfer;
mod zone;

pub use catalog::{Bounds, ZoneCatalog};
pub use error::{CatalogError, CollectionError, TransferError};
pub use gate::{
    DenyReason, NEAR_TIER_METERS, ProximityGate, SCAN_RADIUS_METERS, ScanPermission, ScanTier,
};
pub use geo::{Coordinate, EARTH_RADIUS_M, distance_m};
pub use ledger::{CollectedSticker, CollectionLedger, MintStatus};
pub use overlay::{OverlayStyle, ProjectedZone, ZonePhase, observe_phase, project, visual_radius_m};
pub use progress::BrandProgress;
pub use rarity::StickerRarity;
pub use transfer::TransferRequest;
pub use zone::{Rgb, Zone};
