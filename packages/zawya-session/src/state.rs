//! Application state shared across handlers.

use crate::config::{Config, MintMode};
use crate::location::LocationFeed;
use crate::session::SessionHandle;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SessionHandle,
    /// Device-side location provider; HTTP clients publish fixes into it.
    pub feed: LocationFeed,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    pub fn new(config: Config, session: SessionHandle, feed: LocationFeed) -> Self {
        Self {
            config,
            session,
            feed,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn mint_mode(&self) -> MintMode {
        self.config.mint.mode
    }
}
