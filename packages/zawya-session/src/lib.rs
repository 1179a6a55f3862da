//! # Zawya session service
//!
//! Location-gated sticker collection for a city-scale treasure hunt. One
//! session task owns the album and the user's location; HTTP handlers talk
//! to it through a [`SessionHandle`]. Collected stickers are minted
//! best-effort through a JSON-RPC relay.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin zawya
//! ```
//!
//! ## Endpoints
//! - `GET /health` - Liveness and album summary
//! - `GET /metrics` - Prometheus counters
//! - `GET /zones` - Zones projected around the current location
//! - `GET /zones/{zone_id}/scan` - Proximity gate verdict for one zone
//! - `POST /location`, `/location/permission`, `/location/refresh` - Location input
//! - `POST /scan` - Raw QR payload; `POST /collect` - decoded claim
//! - `GET /progress`, `GET /album` - Collection state
//! - `POST /transfer` - Send stickers of one brand to a friend

pub mod album_store;
pub mod config;
mod error;
mod handlers;
pub mod location;
pub mod metrics;
mod middleware;
pub mod mint;
mod response;
mod router;
pub mod scan;
pub mod session;
mod state;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use session::{Session, SessionHandle, SessionSettings};
pub use state::AppState;
