//! The session actor: single owner of the album, the catalog, and the
//! user's location.
//!
//! Every notification (location fix, scan result, mint completion) is a
//! [`Command`] on one bounded channel, so ledger mutations are serialized
//! without locks. Mints run on their own tasks and report back through the
//! same channel; a failed mint never retracts the album entry.

use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use zawya_types::{
    observe_phase, project, BrandProgress, CollectedSticker, CollectionError, CollectionLedger,
    Coordinate, DenyReason, MintStatus, OverlayStyle, ProximityGate, ScanPermission,
    TransferError, TransferRequest, Zone, ZonePhase,
};

use crate::album_store::AlbumStore;
use crate::config::Config;
use crate::location::{
    resolve_location, Fix, LocationOrigin, LocationPolicy, LocationSource, ResolvedLocation,
};
use crate::metrics::METRICS;
use crate::mint::{MintError, MintRequest, Minter};
use crate::scan::{now_ms, parse_payload, StickerClaim};

/// Session tunables, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub gate: ProximityGate,
    pub location_policy: LocationPolicy,
    pub qr_max_age: Duration,
    pub command_buffer: usize,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Result<Self, crate::Error> {
        Ok(Self {
            gate: config.gate()?,
            location_policy: config.location_policy(),
            qr_max_age: config.qr_max_age(),
            command_buffer: config.command_buffer,
        })
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        let config = Config::default();
        Self {
            gate: ProximityGate::default(),
            location_policy: config.location_policy(),
            qr_max_age: config.qr_max_age(),
            command_buffer: config.command_buffer,
        }
    }
}

/// Result of a scan or collect attempt, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Collected {
        sticker: CollectedSticker,
        remaining: u32,
    },
    Denied {
        permission: ScanPermission,
    },
    Rejected {
        error: CollectionError,
    },
    InvalidPayload {
        reason: String,
    },
}

/// One zone as the map should render it, with derived gameplay state.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneView {
    pub zone: Zone,
    pub distance_m: Option<f64>,
    pub visual_radius_m: f64,
    pub emphasized: bool,
    pub style: OverlayStyle,
    pub phase: ZonePhase,
    pub scan: ScanPermission,
    pub remaining: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlaySnapshot {
    pub location: Option<ResolvedLocation>,
    pub zones: Vec<ZoneView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumEntry {
    #[serde(flatten)]
    pub sticker: CollectedSticker,
    pub mint: MintStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub zones: usize,
    pub album_size: usize,
    pub pending_mints: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferFailure {
    Invalid(TransferError),
    Chain(MintError),
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferFailure::Invalid(e) => write!(f, "{e}"),
            TransferFailure::Chain(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransferFailure {}

type Reply<T> = oneshot::Sender<T>;

enum Command {
    LocationChanged(Fix),
    SetPermission(bool),
    RefreshLocation(Option<Reply<ResolvedLocation>>),
    LocationResolved(ResolvedLocation, Option<Reply<ResolvedLocation>>),
    CanScan(String, Reply<Option<ScanPermission>>),
    Scan(String, Reply<ScanOutcome>),
    Collect(StickerClaim, Reply<ScanOutcome>),
    Overlay(Reply<OverlaySnapshot>),
    Progress(Reply<Vec<BrandProgress>>),
    Album(Option<String>, Reply<Vec<AlbumEntry>>),
    Stats(Reply<SessionStats>),
    Transfer(TransferRequest, Reply<Result<String, TransferFailure>>),
    MintResolved {
        sticker_id: String,
        result: Result<String, MintError>,
        started: Instant,
    },
}

/// Cloneable handle for UI event handlers. Dropping a call's future discards its reply.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

pub struct Session<L, M> {
    ledger: CollectionLedger,
    settings: SessionSettings,
    location: Option<ResolvedLocation>,
    permission: bool,
    source: Arc<L>,
    minter: Arc<M>,
    store: Option<AlbumStore>,
    rx: mpsc::Receiver<Command>,
    feedback: mpsc::WeakSender<Command>,
    /// Cancels in-flight mint and location tasks when the session stops.
    tasks: CancellationToken,
}

impl<L: LocationSource, M: Minter> Session<L, M> {
    pub fn new(
        settings: SessionSettings,
        ledger: CollectionLedger,
        source: Arc<L>,
        minter: Arc<M>,
        store: Option<AlbumStore>,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(settings.command_buffer.max(1));
        let session = Self {
            ledger,
            settings,
            location: None,
            permission: source.has_permission(),
            source,
            minter,
            store,
            rx,
            feedback: tx.downgrade(),
            tasks: CancellationToken::new(),
        };
        (session, SessionHandle { tx })
    }

    /// Process commands until `cancel` fires or every handle is dropped,
    /// then persist the album.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            zones = self.ledger.catalog().len(),
            album = self.ledger.len(),
            scan_radius_m = self.settings.gate.scan_radius_m(),
            "Session started"
        );
        self.spawn_resolve(None);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session cancelled");
                    break;
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => {
                        info!("All session handles dropped");
                        break;
                    }
                },
            }
        }

        self.tasks.cancel();
        self.persist();
        info!(album = self.ledger.len(), "Session stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::LocationChanged(fix) => self.on_location(fix),
            Command::SetPermission(granted) => {
                info!(granted, "Location permission changed");
                self.permission = granted;
            }
            Command::RefreshLocation(reply) => self.spawn_resolve(reply),
            Command::LocationResolved(resolved, reply) => self.on_resolved(resolved, reply),
            Command::CanScan(zone_id, reply) => {
                let permission = self
                    .ledger
                    .catalog()
                    .get(&zone_id)
                    .map(|zone| {
                        self.settings
                            .gate
                            .can_scan(self.trusted_location().as_ref(), zone)
                    });
                let _ = reply.send(permission);
            }
            Command::Scan(payload, reply) => {
                METRICS.scan_total.fetch_add(1, Ordering::Relaxed);
                let outcome = match parse_payload(&payload, now_ms(), self.settings.qr_max_age) {
                    Ok(claim) => self.collect(claim),
                    Err(e) => {
                        METRICS.scan_invalid_payload.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "Rejected sticker payload");
                        ScanOutcome::InvalidPayload {
                            reason: e.to_string(),
                        }
                    }
                };
                let _ = reply.send(outcome);
            }
            Command::Collect(claim, reply) => {
                METRICS.scan_total.fetch_add(1, Ordering::Relaxed);
                let _ = reply.send(self.collect(claim));
            }
            Command::Overlay(reply) => {
                let _ = reply.send(self.overlay());
            }
            Command::Progress(reply) => {
                let _ = reply.send(self.ledger.brand_progress());
            }
            Command::Album(brand, reply) => {
                let _ = reply.send(self.album(brand.as_deref()));
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            Command::Transfer(request, reply) => self.transfer(request, reply),
            Command::MintResolved {
                sticker_id,
                result,
                started,
            } => self.on_mint_resolved(sticker_id, result, started),
        }
    }

    /// The user's location, if it may gate a scan: permission granted and
    /// not the configured fallback.
    fn trusted_location(&self) -> Option<Coordinate> {
        self.location
            .filter(|l| self.permission && l.origin.is_trusted())
            .map(|l| l.coordinate)
    }

    fn on_location(&mut self, fix: Fix) {
        if !fix.coordinate.is_valid() {
            warn!(
                lat = fix.coordinate.latitude,
                lon = fix.coordinate.longitude,
                "Ignoring invalid fix"
            );
            return;
        }
        METRICS.location_updates.fetch_add(1, Ordering::Relaxed);
        debug!(lat = fix.coordinate.latitude, lon = fix.coordinate.longitude, "Location changed");
        self.location = Some(ResolvedLocation {
            coordinate: fix.coordinate,
            origin: LocationOrigin::Live,
        });
    }

    fn on_resolved(&mut self, resolved: ResolvedLocation, reply: Option<Reply<ResolvedLocation>>) {
        // A resolve runs concurrently with live updates: a fallback never
        // replaces a trusted position, and only a fresh fix replaces a live one.
        let keep_current = self.permission
            && self.location.is_some_and(|current| match (current.origin, resolved.origin) {
                (_, LocationOrigin::Fallback) => current.origin.is_trusted(),
                (LocationOrigin::Live, origin) => origin != LocationOrigin::Fresh,
                _ => false,
            });
        if keep_current {
            debug!(origin = ?resolved.origin, "Keeping newer location over resolver result");
        } else {
            info!(
                origin = ?resolved.origin,
                lat = resolved.coordinate.latitude,
                lon = resolved.coordinate.longitude,
                "Location resolved"
            );
            self.location = Some(resolved);
        }
        if let Some(reply) = reply {
            let _ = reply.send(self.location.unwrap_or(resolved));
        }
    }

    fn spawn_resolve(&self, reply: Option<Reply<ResolvedLocation>>) {
        let source = Arc::clone(&self.source);
        let policy = self.settings.location_policy;
        let feedback = self.feedback.clone();
        let cancel = self.tasks.clone();
        tokio::spawn(async move {
            let resolved = tokio::select! {
                _ = cancel.cancelled() => return,
                r = resolve_location(source.as_ref(), &policy) => r,
            };
            if let Some(tx) = feedback.upgrade() {
                let _ = tx.send(Command::LocationResolved(resolved, reply)).await;
            }
        });
    }

    fn collect(&mut self, claim: StickerClaim) -> ScanOutcome {
        let Some(zone) = self.ledger.catalog().get(&claim.zone_id) else {
            METRICS.collect_rejected_other.fetch_add(1, Ordering::Relaxed);
            return ScanOutcome::Rejected {
                error: CollectionError::UnknownZone(claim.zone_id),
            };
        };

        let permission = self.settings.gate.can_scan(self.trusted_location().as_ref(), zone);
        match permission {
            ScanPermission::Allowed { .. } => {
                METRICS.scan_allowed.fetch_add(1, Ordering::Relaxed);
            }
            ScanPermission::Denied(reason) => {
                let counter = match reason {
                    DenyReason::NoLocation => &METRICS.scan_no_location,
                    DenyReason::TooFar { .. } => &METRICS.scan_too_far,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                info!(zone = %zone.id, ?reason, "Scan denied");
                return ScanOutcome::Denied { permission };
            }
        }

        let quota = zone.quota;
        match self
            .ledger
            .collect(&claim.sticker_id, &claim.zone_id, &claim.brand_name, now_ms())
        {
            Ok(sticker) => {
                METRICS.collect_success.fetch_add(1, Ordering::Relaxed);
                let remaining = self.ledger.remaining_in_zone(&sticker.zone_id);
                info!(
                    sticker = %sticker.sticker_id,
                    zone = %sticker.zone_id,
                    rarity = ?sticker.rarity,
                    remaining,
                    "Sticker collected"
                );
                self.persist();
                self.dispatch_mint(&sticker, quota);
                ScanOutcome::Collected { sticker, remaining }
            }
            Err(error) => {
                let counter = match &error {
                    CollectionError::AlreadyOwned(_) => &METRICS.collect_already_owned,
                    CollectionError::ZoneExhausted(_) => &METRICS.collect_zone_exhausted,
                    _ => &METRICS.collect_rejected_other,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                info!(sticker = %claim.sticker_id, error = %error, "Collection rejected");
                ScanOutcome::Rejected { error }
            }
        }
    }

    fn dispatch_mint(&self, sticker: &CollectedSticker, quota: u32) {
        let request = MintRequest {
            sticker_id: sticker.sticker_id.clone(),
            zone_id: sticker.zone_id.clone(),
            brand_name: sticker.brand.clone(),
            quota,
        };
        let minter = Arc::clone(&self.minter);
        let feedback = self.feedback.clone();
        let cancel = self.tasks.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let sticker_id = request.sticker_id.clone();
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(sticker = %sticker_id, "Mint abandoned on shutdown");
                    return;
                }
                r = minter.mint(request) => r,
            };
            if let Some(tx) = feedback.upgrade() {
                let _ = tx
                    .send(Command::MintResolved {
                        sticker_id,
                        result,
                        started,
                    })
                    .await;
            }
        });
    }

    fn on_mint_resolved(
        &mut self,
        sticker_id: String,
        result: Result<String, MintError>,
        started: Instant,
    ) {
        METRICS.record_mint_duration(started);
        match result {
            Ok(token_ref) => {
                METRICS.mint_success.fetch_add(1, Ordering::Relaxed);
                info!(sticker = %sticker_id, token = %token_ref, "Sticker minted");
                self.ledger.mark_minted(&sticker_id, token_ref);
            }
            Err(MintError::Disabled) => {
                debug!(sticker = %sticker_id, "Minting disabled, album entry kept");
                self.ledger.mark_mint_failed(&sticker_id, MintError::Disabled.to_string());
            }
            Err(e) => {
                METRICS.mint_failed.fetch_add(1, Ordering::Relaxed);
                // The album entry stays; the mint is best-effort.
                error!(sticker = %sticker_id, error = %e, "Mint failed, album entry kept");
                self.ledger.mark_mint_failed(&sticker_id, e.to_string());
            }
        }
        self.persist();
    }

    fn transfer(&self, request: TransferRequest, reply: Reply<Result<String, TransferFailure>>) {
        let brand = match request.validate(&self.ledger) {
            Ok(brand) => brand.to_string(),
            Err(e) => {
                info!(error = %e, "Transfer rejected");
                let _ = reply.send(Err(TransferFailure::Invalid(e)));
                return;
            }
        };
        info!(
            friend = %request.friend_id,
            count = request.sticker_ids.len(),
            brand = %brand,
            "Transfer dispatched"
        );
        let minter = Arc::clone(&self.minter);
        let cancel = self.tasks.clone();
        tokio::spawn(async move {
            let TransferRequest {
                friend_id,
                sticker_ids,
            } = request;
            let result = tokio::select! {
                _ = cancel.cancelled() => return,
                r = minter.transfer(friend_id, sticker_ids) => r,
            };
            if let Err(e) = &result {
                warn!(error = %e, "Transfer failed");
            }
            let _ = reply.send(result.map_err(TransferFailure::Chain));
        });
    }

    fn overlay(&self) -> OverlaySnapshot {
        let any_location = self.location.map(|l| l.coordinate);
        let trusted = self.trusted_location();
        let zones = project(self.ledger.catalog().list_zones(), any_location.as_ref())
            .into_iter()
            .map(|p| ZoneView {
                zone: p.zone.clone(),
                distance_m: p.distance_m,
                visual_radius_m: p.visual_radius_m,
                emphasized: p.emphasized,
                style: p.style,
                phase: observe_phase(&self.settings.gate, p.zone, trusted.as_ref()),
                scan: self.settings.gate.can_scan(trusted.as_ref(), p.zone),
                remaining: self.ledger.remaining_in_zone(&p.zone.id),
            })
            .collect();
        OverlaySnapshot {
            location: self.location,
            zones,
        }
    }

    fn album(&self, brand: Option<&str>) -> Vec<AlbumEntry> {
        let entry = |s: &CollectedSticker| AlbumEntry {
            sticker: s.clone(),
            mint: self
                .ledger
                .mint_status(&s.sticker_id)
                .cloned()
                .unwrap_or(MintStatus::Pending),
        };
        match brand {
            Some(brand) => self.ledger.stickers_for_brand(brand).map(entry).collect(),
            None => self.ledger.stickers().map(entry).collect(),
        }
    }

    fn stats(&self) -> SessionStats {
        let pending_mints = self
            .ledger
            .stickers()
            .filter(|s| matches!(self.ledger.mint_status(&s.sticker_id), Some(MintStatus::Pending)))
            .count();
        SessionStats {
            zones: self.ledger.catalog().len(),
            album_size: self.ledger.len(),
            pending_mints,
        }
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.ledger) {
                error!(error = %e, "Failed to persist album");
            }
        }
    }
}

impl SessionHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, crate::Error> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| crate::Error::SessionClosed)?;
        rx.await.map_err(|_| crate::Error::SessionClosed)
    }

    /// Push-style location notification.
    pub async fn location_changed(&self, fix: Fix) -> Result<(), crate::Error> {
        self.tx
            .send(Command::LocationChanged(fix))
            .await
            .map_err(|_| crate::Error::SessionClosed)
    }

    pub async fn set_permission(&self, granted: bool) -> Result<(), crate::Error> {
        self.tx
            .send(Command::SetPermission(granted))
            .await
            .map_err(|_| crate::Error::SessionClosed)
    }

    /// Run the location fallback chain and apply its result.
    pub async fn refresh_location(&self) -> Result<ResolvedLocation, crate::Error> {
        self.request(|r| Command::RefreshLocation(Some(r))).await
    }

    pub async fn can_scan(&self, zone_id: &str) -> Result<ScanPermission, crate::Error> {
        let zone_id = zone_id.to_string();
        self.request(|r| Command::CanScan(zone_id.clone(), r))
            .await?
            .ok_or(crate::Error::UnknownZone(zone_id))
    }

    /// Raw QR text from the scanner.
    pub async fn scan(&self, payload: impl Into<String>) -> Result<ScanOutcome, crate::Error> {
        let payload = payload.into();
        self.request(|r| Command::Scan(payload, r)).await
    }

    /// An already-validated claim from the scanner.
    pub async fn collect(&self, claim: StickerClaim) -> Result<ScanOutcome, crate::Error> {
        self.request(|r| Command::Collect(claim, r)).await
    }

    pub async fn overlay(&self) -> Result<OverlaySnapshot, crate::Error> {
        self.request(Command::Overlay).await
    }

    pub async fn progress(&self) -> Result<Vec<BrandProgress>, crate::Error> {
        self.request(Command::Progress).await
    }

    pub async fn album(&self) -> Result<Vec<AlbumEntry>, crate::Error> {
        self.request(|r| Command::Album(None, r)).await
    }

    /// Album entries of one brand, the candidates for a transfer.
    pub async fn album_for_brand(&self, brand: &str) -> Result<Vec<AlbumEntry>, crate::Error> {
        let brand = brand.to_string();
        self.request(|r| Command::Album(Some(brand), r)).await
    }

    pub async fn stats(&self) -> Result<SessionStats, crate::Error> {
        self.request(Command::Stats).await
    }

    pub async fn transfer(
        &self,
        request: TransferRequest,
    ) -> Result<Result<String, TransferFailure>, crate::Error> {
        self.request(|r| Command::Transfer(request, r)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
