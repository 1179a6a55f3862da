//! HTTP router setup.

use crate::handlers;
use crate::middleware::inject_request_id;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/zones", get(handlers::zones))
        .route("/zones/{zone_id}/scan", get(handlers::zone_scan))
        .route("/location", post(handlers::update_location))
        .route("/location/permission", post(handlers::update_permission))
        .route("/location/refresh", post(handlers::refresh_location))
        .route("/scan", post(handlers::scan))
        .route("/collect", post(handlers::collect))
        .route("/progress", get(handlers::progress))
        .route("/album", get(handlers::album))
        .route("/transfer", post(handlers::transfer))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(inject_request_id)),
        )
        .with_state(state)
}
