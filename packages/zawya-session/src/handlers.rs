//! HTTP request handlers.

use crate::config::MintMode;
use crate::location::{Fix, ResolvedLocation};
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::response::{
    AckResponse, AlbumQuery, HealthResponse, LocationUpdate, PermissionUpdate, ScanRequest,
    TransferResponse,
};
use crate::scan::StickerClaim;
use crate::session::{AlbumEntry, OverlaySnapshot, ScanOutcome, TransferFailure};
use crate::state::AppState;
use crate::Error;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use zawya_types::{BrandProgress, CollectionError, Coordinate, ScanPermission, TransferRequest};

/// Liveness plus album summary.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, Error> {
    let stats = state.session.stats().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        zones: stats.zones,
        album: stats.album_size,
        pending_mints: stats.pending_mints,
        mint_mode: match state.mint_mode() {
            MintMode::Disabled => "disabled",
            MintMode::Rpc => "rpc",
        },
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
    }))
}

/// Prometheus metrics in text exposition format.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, Error> {
    let stats = state.session.stats().await?;
    let body = METRICS.render(stats.album_size, stats.pending_mints);
    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    ))
}

/// Every zone projected for the map around the current location.
pub async fn zones(State(state): State<Arc<AppState>>) -> Result<Json<OverlaySnapshot>, Error> {
    Ok(Json(state.session.overlay().await?))
}

pub async fn zone_scan(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<String>,
) -> Result<Json<ScanPermission>, Error> {
    Ok(Json(state.session.can_scan(&zone_id).await?))
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LocationUpdate>,
) -> Result<Json<AckResponse>, Error> {
    let coordinate = Coordinate::new(update.latitude, update.longitude);
    if !coordinate.is_valid() {
        return Err(Error::BadRequest(format!(
            "coordinate out of range: {}, {}",
            update.latitude, update.longitude
        )));
    }
    let fix = Fix::now(coordinate);
    state.feed.publish(fix);
    state.session.location_changed(fix).await?;
    Ok(Json(AckResponse::ok()))
}

pub async fn update_permission(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PermissionUpdate>,
) -> Result<Json<AckResponse>, Error> {
    state.feed.set_permission(update.granted);
    state.session.set_permission(update.granted).await?;
    Ok(Json(AckResponse::ok()))
}

/// Re-run the location fallback chain. Bounded by the configured attempts and timeout.
pub async fn refresh_location(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolvedLocation>, Error> {
    Ok(Json(state.session.refresh_location().await?))
}

/// Raw QR text from the scanner.
pub async fn scan(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanOutcome>), Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let outcome = state.session.scan(request.payload).await?;
    info!(request_id = %request_id.0, status = %outcome_status(&outcome), "Scan handled");
    Ok((outcome_status(&outcome), Json(outcome)))
}

/// A claim already decoded and verified by the scanner.
pub async fn collect(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(claim): Json<StickerClaim>,
) -> Result<(StatusCode, Json<ScanOutcome>), Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let outcome = state.session.collect(claim).await?;
    info!(request_id = %request_id.0, status = %outcome_status(&outcome), "Collect handled");
    Ok((outcome_status(&outcome), Json(outcome)))
}

pub async fn progress(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BrandProgress>>, Error> {
    Ok(Json(state.session.progress().await?))
}

/// The album, optionally narrowed with `?brand=`.
pub async fn album(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AlbumQuery>,
) -> Result<Json<Vec<AlbumEntry>>, Error> {
    let entries = match query.brand.as_deref().filter(|b| !b.is_empty()) {
        Some(brand) => state.session.album_for_brand(brand).await?,
        None => state.session.album().await?,
    };
    Ok(Json(entries))
}

pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    match state.session.transfer(request).await? {
        Ok(tx_ref) => {
            info!(request_id = %request_id.0, tx = %tx_ref, "Transfer submitted");
            Ok((StatusCode::OK, Json(TransferResponse::ok(tx_ref))))
        }
        Err(TransferFailure::Invalid(e)) => {
            Ok((StatusCode::BAD_REQUEST, Json(TransferResponse::err(e.to_string()))))
        }
        Err(TransferFailure::Chain(e)) => {
            warn!(request_id = %request_id.0, error = %e, "Transfer failed upstream");
            Ok((StatusCode::BAD_GATEWAY, Json(TransferResponse::err(e.to_string()))))
        }
    }
}

fn outcome_status(outcome: &ScanOutcome) -> StatusCode {
    match outcome {
        ScanOutcome::Collected { .. } => StatusCode::OK,
        ScanOutcome::Denied { .. } => StatusCode::FORBIDDEN,
        ScanOutcome::Rejected {
            error: CollectionError::UnknownZone(_),
        } => StatusCode::NOT_FOUND,
        ScanOutcome::Rejected {
            error: CollectionError::InvalidInput(_) | CollectionError::BrandMismatch { .. },
        } => StatusCode::BAD_REQUEST,
        ScanOutcome::Rejected { .. } => StatusCode::CONFLICT,
        ScanOutcome::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
    }
}
