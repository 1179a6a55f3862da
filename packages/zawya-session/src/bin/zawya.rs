//! Zawya session service binary.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zawya_session::album_store::AlbumStore;
use zawya_session::config::MintMode;
use zawya_session::location::LocationFeed;
use zawya_session::mint::{AnyMinter, DisabledMinter, JsonRpcMinter};
use zawya_session::{create_router, AppState, Config, Session, SessionSettings};
use zawya_types::{CollectionLedger, ZoneCatalog};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Zawya session service");

    if !std::path::Path::new("zawya.toml").exists() {
        warn!("No zawya.toml found, using defaults and ZAWYA_* env vars");
    }

    let config = Config::load().unwrap_or_else(|e| {
        error!(error = %e, "FATAL: Config error, fix ZAWYA_* env vars or zawya.toml");
        std::process::exit(1);
    });

    info!(
        scan_radius_m = config.scan_radius_m,
        mint = ?config.mint.mode,
        album = %config.album_path,
        "Configuration loaded"
    );

    let catalog = Arc::new(ZoneCatalog::lausanne());

    let store = if config.album_path.is_empty() {
        warn!("album_path is empty, the album will not survive a restart");
        None
    } else {
        Some(AlbumStore::new(config.album_path.clone().into()))
    };
    let ledger = match &store {
        Some(store) => CollectionLedger::hydrate(Arc::clone(&catalog), store.load()?)?,
        None => CollectionLedger::new(Arc::clone(&catalog)),
    };

    let minter = match config.mint.mode {
        MintMode::Disabled => {
            warn!("Minting disabled, stickers stay local (dev mode)");
            AnyMinter::Disabled(DisabledMinter)
        }
        MintMode::Rpc => {
            let rpc = JsonRpcMinter::new(&config.mint)?;
            info!(rpc = %rpc.active_url(), "Minting through JSON-RPC relay");
            AnyMinter::Rpc(rpc)
        }
    };

    let feed = LocationFeed::new(true);
    let settings = SessionSettings::from_config(&config)?;
    let (session, handle) = Session::new(
        settings,
        ledger,
        Arc::new(feed.clone()),
        Arc::new(minter),
        store,
    );

    let cancel = CancellationToken::new();
    let session_task = tokio::spawn(session.run(cancel.clone()));

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config, handle, feed));
    let app = create_router(state);

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping session...");
    cancel.cancel();

    match tokio::time::timeout(std::time::Duration::from_secs(10), session_task).await {
        Ok(Ok(())) => info!("Album persisted"),
        Ok(Err(e)) => error!(error = %e, "Session task panicked"),
        Err(_) => warn!("Session shutdown timed out, album may be stale"),
    }

    info!("Zawya shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
