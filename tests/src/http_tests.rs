//! HTTP facade tests, driven in-process through the router.

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use zawya_session::{create_router, AppState, Config};

use crate::utils::TestSession;

fn router(session: &TestSession) -> Router {
    let state = AppState::new(
        Config::default(),
        session.handle.clone(),
        session.feed.clone(),
    );
    create_router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health_reports_catalog_and_album() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);

    let (status, body) = send(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["zones"], 9);
    assert_eq!(body["album"], 0);
    assert_eq!(body["mint_mode"], "disabled");

    session.shutdown().await
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);

    let request = Request::builder()
        .uri("/progress")
        .header("x-request-id", "trace-42")
        .body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.headers()["x-request-id"], "trace-42");

    let request = Request::builder().uri("/progress").body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    let generated = response.headers()["x-request-id"].to_str()?.to_string();
    assert!(generated.starts_with("zaw-"), "got {generated}");

    session.shutdown().await
}

#[tokio::test]
async fn test_walk_and_collect_over_http() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);

    let claim = json!({"sticker_id": "h-1", "zone_id": "nike_1", "brand_name": "Nike"});

    let (status, body) = send(&app, "POST", "/collect", Some(claim.clone())).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["outcome"], "denied");

    let (status, _) = send(
        &app,
        "POST",
        "/location",
        Some(json!({"latitude": 46.5220, "longitude": 6.6350})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/zones/nike_1/scan", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "allowed");

    let (status, body) = send(&app, "POST", "/collect", Some(claim.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "collected");
    assert_eq!(body["remaining"], 3);
    assert_eq!(body["sticker"]["rarity"], "legendary");

    let (status, body) = send(&app, "POST", "/collect", Some(claim)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "already_owned");

    let (_, body) = send(&app, "GET", "/progress", None).await?;
    let nike = body
        .as_array()
        .and_then(|p| p.iter().find(|b| b["brand"] == "Nike"))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(nike["collected"], 1);
    assert_eq!(nike["total"], 10);

    let (_, album) = send(&app, "GET", "/album", None).await?;
    assert_eq!(album[0]["sticker_id"], "h-1");

    let (_, nike) = send(&app, "GET", "/album?brand=Nike", None).await?;
    assert_eq!(nike.as_array().map(Vec::len), Some(1));
    let (_, sephora) = send(&app, "GET", "/album?brand=Sephora", None).await?;
    assert_eq!(sephora.as_array().map(Vec::len), Some(0));

    session.shutdown().await
}

#[tokio::test]
async fn test_zones_overlay() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);
    send(
        &app,
        "POST",
        "/location",
        Some(json!({"latitude": 46.5197, "longitude": 6.6323})),
    )
    .await?;

    let (status, body) = send(&app, "GET", "/zones", None).await?;
    assert_eq!(status, StatusCode::OK);
    let zones = body["zones"].as_array().cloned().unwrap_or_default();
    assert_eq!(zones.len(), 9);
    let here = zones
        .iter()
        .find(|z| z["zone"]["id"] == "mcdo_1")
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(here["visual_radius_m"], 5.0);
    assert_eq!(here["emphasized"], true);
    assert_eq!(here["phase"], "scannable");
    assert_eq!(here["zone"]["radius_m"], 150.0);
    assert_eq!(body["location"]["origin"], "live");

    session.shutdown().await
}

#[tokio::test]
async fn test_bad_inputs() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);

    let (status, _) = send(
        &app,
        "POST",
        "/location",
        Some(json!({"latitude": 123.0, "longitude": 6.6})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/zones/atlantis/scan", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "POST", "/scan", Some(json!({"payload": "{}"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["outcome"], "invalid_payload");

    let (status, body) = send(
        &app,
        "POST",
        "/transfer",
        Some(json!({"friend_id": "", "sticker_ids": []})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    session.shutdown().await
}

#[tokio::test]
async fn test_permission_revoked_over_http() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);
    send(
        &app,
        "POST",
        "/location",
        Some(json!({"latitude": 46.5250, "longitude": 6.6280})),
    )
    .await?;
    send(&app, "POST", "/location/permission", Some(json!({"granted": false}))).await?;

    let (_, body) = send(&app, "GET", "/zones/mcdo_2/scan", None).await?;
    assert_eq!(body["status"], "denied");
    assert_eq!(body["reason"], "no_location");

    let (status, body) = send(&app, "POST", "/location/refresh", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "fallback");

    session.shutdown().await
}

#[tokio::test]
async fn test_metrics_exposition() -> Result<()> {
    let session = TestSession::start(true, None)?;
    let app = router(&session);
    let (status, body) = send(&app, "GET", "/metrics", None).await?;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap_or_default();
    assert!(text.contains("zawya_album_size 0"));
    session.shutdown().await
}
