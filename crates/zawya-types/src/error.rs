/// Catalog construction error.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    DuplicateZone(String),
    Invalid(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateZone(id) => write!(f, "duplicate zone id: {id}"),
            Self::Invalid(msg) => write!(f, "invalid catalog: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Why a sticker could not be added to the album.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CollectionError {
    AlreadyOwned(String),
    ZoneExhausted(String),
    UnknownZone(String),
    BrandMismatch {
        zone_id: String,
        expected: String,
        got: String,
    },
    InvalidInput(String),
}

impl std::fmt::Display for CollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyOwned(id) => write!(f, "sticker {id} already collected"),
            Self::ZoneExhausted(zone) => write!(f, "all stickers in zone {zone} collected"),
            Self::UnknownZone(zone) => write!(f, "unknown zone: {zone}"),
            Self::BrandMismatch {
                zone_id,
                expected,
                got,
            } => write!(f, "zone {zone_id} belongs to {expected}, not {got}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Transfer request rejected before it reaches the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferError {
    MissingFriend,
    NothingSelected,
    NotOwned(String),
    Duplicate(String),
    MixedBrands,
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFriend => write!(f, "no friend id set"),
            Self::NothingSelected => write!(f, "no stickers selected"),
            Self::NotOwned(id) => write!(f, "sticker {id} is not in the album"),
            Self::Duplicate(id) => write!(f, "sticker {id} selected twice"),
            Self::MixedBrands => write!(f, "cannot transfer stickers from different brands"),
        }
    }
}

impl std::error::Error for TransferError {}
