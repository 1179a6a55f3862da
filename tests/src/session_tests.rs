//! Session actor behavior: concurrency, persistence, and location resolution.

use anyhow::Result;
use std::sync::Arc;
use zawya_session::album_store::AlbumStore;
use zawya_session::location::LocationOrigin;
use zawya_session::scan::{create_payload, StickerClaim};
use zawya_session::session::{ScanOutcome, TransferFailure};
use zawya_types::{CollectionError, Coordinate, MintStatus, TransferError, TransferRequest};

use crate::utils::{temp_album, RecordingMinter, TestSession};

const MCDO_2: Coordinate = Coordinate::new(46.5250, 6.6280);
const SEPHORA_4: Coordinate = Coordinate::new(46.5300, 6.6350);

fn claim(id: &str, zone: &str, brand: &str) -> StickerClaim {
    StickerClaim {
        sticker_id: id.into(),
        zone_id: zone.into(),
        brand_name: brand.into(),
    }
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_scans_never_exceed_quota() -> Result<()> {
    let session = TestSession::start(true, None)?;
    session.move_to(SEPHORA_4).await?;

    let mut tasks = Vec::new();
    for i in 0..10 {
        let handle = session.handle.clone();
        tasks.push(tokio::spawn(async move {
            handle
                .collect(claim(&format!("race-{i}"), "sephora_4", "Sephora"))
                .await
        }));
    }

    let mut collected = 0;
    let mut exhausted = 0;
    for task in tasks {
        match task.await?? {
            ScanOutcome::Collected { .. } => collected += 1,
            ScanOutcome::Rejected {
                error: CollectionError::ZoneExhausted(_),
            } => exhausted += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(collected, 3);
    assert_eq!(exhausted, 7);
    assert_eq!(session.handle.album().await?.len(), 3);

    session.shutdown().await
}

#[tokio::test]
async fn test_same_sticker_scanned_twice_at_once() -> Result<()> {
    let session = TestSession::start(true, None)?;
    session.move_to(MCDO_2).await?;

    let a = session.handle.collect(claim("dup", "mcdo_2", "McDonald's"));
    let b = session.handle.collect(claim("dup", "mcdo_2", "McDonald's"));
    let (a, b) = tokio::join!(a, b);
    let outcomes = [a?, b?];

    let wins = outcomes
        .iter()
        .filter(|o| matches!(o, ScanOutcome::Collected { .. }))
        .count();
    assert_eq!(wins, 1);
    assert!(outcomes.iter().any(|o| matches!(
        o,
        ScanOutcome::Rejected {
            error: CollectionError::AlreadyOwned(_)
        }
    )));

    session.shutdown().await
}

// ── Persistence ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_album_survives_restart() -> Result<()> {
    let path = temp_album("restart");

    let session = TestSession::start(true, Some(AlbumStore::new(path.clone())))?;
    session.move_to(MCDO_2).await?;
    session
        .handle
        .collect(claim("keep-1", "mcdo_2", "McDonald's"))
        .await?;
    assert_eq!(
        session.wait_for_mint("keep-1").await?,
        MintStatus::Minted("0xkeep-1".into())
    );
    session.shutdown().await?;

    let restarted = TestSession::start(true, Some(AlbumStore::new(path.clone())))?;
    let album = restarted.handle.album().await?;
    assert_eq!(album.len(), 1);
    assert_eq!(album[0].sticker.sticker_id, "keep-1");
    assert_eq!(album[0].mint, MintStatus::Minted("0xkeep-1".into()));

    // Still counted against the quota after restart.
    restarted.move_to(MCDO_2).await?;
    let again = restarted
        .handle
        .collect(claim("keep-1", "mcdo_2", "McDonald's"))
        .await?;
    assert!(matches!(again, ScanOutcome::Rejected { .. }));
    restarted.shutdown().await?;

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[tokio::test]
async fn test_failed_mint_is_persisted_with_entry() -> Result<()> {
    let path = temp_album("failed_mint");
    let minter = Arc::new(RecordingMinter::default());
    minter.set_failing(true);

    let session = TestSession::start_with(true, Some(AlbumStore::new(path.clone())), minter)?;
    session.move_to(MCDO_2).await?;
    session
        .handle
        .scan(create_payload("mcdo_2", "McDonald's"))
        .await?;
    let album = session.handle.album().await?;
    let id = album[0].sticker.sticker_id.clone();
    assert!(matches!(session.wait_for_mint(&id).await?, MintStatus::Failed(_)));
    assert_eq!(session.minter.mint_count(), 1);
    session.shutdown().await?;

    let records = AlbumStore::new(path.clone()).load()?;
    assert_eq!(records.len(), 1);
    assert!(matches!(records[0].1, Some(MintStatus::Failed(_))));

    let _ = std::fs::remove_file(&path);
    Ok(())
}

// ── Location ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_uses_recent_device_fix() -> Result<()> {
    let session = TestSession::start(true, None)?;
    session.feed.publish(zawya_session::location::Fix::now(MCDO_2));

    let resolved = session.handle.refresh_location().await?;
    assert_eq!(resolved.origin, LocationOrigin::Cached);
    assert_eq!(resolved.coordinate, MCDO_2);
    assert!(session.handle.can_scan("mcdo_2").await?.is_allowed());

    session.shutdown().await
}

#[tokio::test]
async fn test_refresh_without_any_fix_falls_back_untrusted() -> Result<()> {
    let session = TestSession::start(true, None)?;

    let resolved = session.handle.refresh_location().await?;
    assert_eq!(resolved.origin, LocationOrigin::Fallback);
    assert!(!session.handle.can_scan("mcdo_2").await?.is_allowed());

    let outcome = session
        .handle
        .collect(claim("nope", "mcdo_2", "McDonald's"))
        .await?;
    assert!(matches!(outcome, ScanOutcome::Denied { .. }));
    assert_eq!(session.minter.mint_count(), 0);

    session.shutdown().await
}

// ── Transfer ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_transfer_validation_and_dispatch() -> Result<()> {
    let session = TestSession::start(true, None)?;
    session.move_to(MCDO_2).await?;
    session.handle.collect(claim("t-1", "mcdo_2", "McDonald's")).await?;
    session.handle.collect(claim("t-2", "mcdo_2", "McDonald's")).await?;

    let candidates = session.handle.album_for_brand("McDonald's").await?;
    assert_eq!(candidates.len(), 2);
    assert!(session.handle.album_for_brand("Nike").await?.is_empty());

    let empty = TransferRequest {
        friend_id: "  ".into(),
        sticker_ids: vec!["t-1".into()],
    };
    assert_eq!(
        session.handle.transfer(empty).await?,
        Err(TransferFailure::Invalid(TransferError::MissingFriend))
    );

    let unknown = TransferRequest {
        friend_id: "amira".into(),
        sticker_ids: vec!["t-9".into()],
    };
    assert!(matches!(
        session.handle.transfer(unknown).await?,
        Err(TransferFailure::Invalid(TransferError::NotOwned(_)))
    ));

    let ok = TransferRequest {
        friend_id: "amira".into(),
        sticker_ids: vec!["t-1".into(), "t-2".into()],
    };
    assert_eq!(session.handle.transfer(ok).await?, Ok("0xtx-2".to_string()));
    let transfers = session.minter.transfers.lock().unwrap().clone();
    assert_eq!(transfers, vec![("amira".to_string(), vec!["t-1".to_string(), "t-2".to_string()])]);

    session.shutdown().await
}
