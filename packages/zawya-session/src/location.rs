//! Location acquisition with a bounded fallback chain.
//!
//! cached (if recent) / fresh fix, retried `attempts` times with a timeout
//! → last known fix of any age → configured fallback coordinate.
//!
//! The chain never blocks past `attempts * timeout`. Only fixes from the
//! device are trusted for scan gating; the fallback coordinate only centers
//! the map.

use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use zawya_types::Coordinate;

use crate::metrics::METRICS;

/// A position reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub recorded_at: SystemTime,
}

impl Fix {
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            recorded_at: SystemTime::now(),
        }
    }

    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.recorded_at)
            .unwrap_or_default()
    }
}

/// Where a resolved location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationOrigin {
    /// Pushed by the device as it moved.
    Live,
    Fresh,
    Cached,
    Stale,
    Fallback,
}

impl LocationOrigin {
    /// Whether this origin may satisfy the proximity gate.
    pub fn is_trusted(self) -> bool {
        !matches!(self, LocationOrigin::Fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub origin: LocationOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationPolicy {
    pub attempts: u32,
    pub timeout: Duration,
    pub max_fix_age: Duration,
    pub fallback: Coordinate,
}

/// Device location provider.
pub trait LocationSource: Send + Sync + 'static {
    fn has_permission(&self) -> bool;

    fn last_known(&self) -> Option<Fix>;

    /// Wait for a new fix. May never resolve; callers bound it with a timeout.
    fn fresh_fix(&self) -> impl Future<Output = Option<Fix>> + Send;
}

/// Run the fallback chain. Dropping the future abandons it.
pub async fn resolve_location<L: LocationSource>(
    source: &L,
    policy: &LocationPolicy,
) -> ResolvedLocation {
    if !source.has_permission() {
        warn!("Location permission denied, using fallback coordinate");
        METRICS.location_fallbacks.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        return ResolvedLocation {
            coordinate: policy.fallback,
            origin: LocationOrigin::Fallback,
        };
    }

    for attempt in 1..=policy.attempts {
        if let Some(fix) = source.last_known() {
            if fix.age() < policy.max_fix_age {
                debug!(attempt, age_ms = fix.age().as_millis() as u64, "Using recent cached fix");
                return ResolvedLocation {
                    coordinate: fix.coordinate,
                    origin: LocationOrigin::Cached,
                };
            }
        }
        match tokio::time::timeout(policy.timeout, source.fresh_fix()).await {
            Ok(Some(fix)) => {
                debug!(attempt, "Fresh fix received");
                return ResolvedLocation {
                    coordinate: fix.coordinate,
                    origin: LocationOrigin::Fresh,
                };
            }
            Ok(None) => debug!(attempt, "Provider returned no fix"),
            Err(_) => debug!(
                attempt,
                timeout_ms = policy.timeout.as_millis() as u64,
                "Fresh fix timed out"
            ),
        }
    }

    if let Some(fix) = source.last_known() {
        info!(age_secs = fix.age().as_secs(), "All fresh attempts failed, using stale fix");
        METRICS.location_stale.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        return ResolvedLocation {
            coordinate: fix.coordinate,
            origin: LocationOrigin::Stale,
        };
    }

    warn!(
        lat = policy.fallback.latitude,
        lon = policy.fallback.longitude,
        "No fix available, using fallback coordinate"
    );
    METRICS.location_fallbacks.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    ResolvedLocation {
        coordinate: policy.fallback,
        origin: LocationOrigin::Fallback,
    }
}

/// Push-fed location source: the UI publishes fixes, the chain consumes them.
#[derive(Clone)]
pub struct LocationFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    fixes: watch::Sender<Option<Fix>>,
    permission: Mutex<bool>,
}

impl LocationFeed {
    pub fn new(permission_granted: bool) -> Self {
        let (fixes, _) = watch::channel(None);
        Self {
            inner: Arc::new(FeedInner {
                fixes,
                permission: Mutex::new(permission_granted),
            }),
        }
    }

    pub fn publish(&self, fix: Fix) {
        self.inner.fixes.send_replace(Some(fix));
    }

    pub fn set_permission(&self, granted: bool) {
        *self.inner.permission.lock().unwrap_or_else(|e| e.into_inner()) = granted;
    }
}

impl LocationSource for LocationFeed {
    fn has_permission(&self) -> bool {
        *self.inner.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn last_known(&self) -> Option<Fix> {
        *self.inner.fixes.borrow()
    }

    fn fresh_fix(&self) -> impl Future<Output = Option<Fix>> + Send {
        let mut rx = self.inner.fixes.subscribe();
        async move {
            rx.changed().await.ok()?;
            let fix = *rx.borrow_and_update();
            fix
        }
    }
}
