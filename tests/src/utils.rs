use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use zawya_session::album_store::AlbumStore;
use zawya_session::location::{Fix, LocationFeed};
use zawya_session::mint::{MintError, MintRequest, Minter};
use zawya_session::{Session, SessionHandle, SessionSettings};
use zawya_types::{CollectionLedger, Coordinate, MintStatus, ZoneCatalog};

/// Minter that records every call and succeeds unless told otherwise.
#[derive(Default)]
pub struct RecordingMinter {
    fail: AtomicBool,
    pub minted: Mutex<Vec<MintRequest>>,
    pub transfers: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingMinter {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn mint_count(&self) -> usize {
        self.minted.lock().unwrap().len()
    }
}

impl Minter for RecordingMinter {
    async fn mint(&self, request: MintRequest) -> Result<String, MintError> {
        let token = format!("0x{}", request.sticker_id);
        self.minted.lock().unwrap().push(request);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MintError::Rpc("relay unavailable".into()));
        }
        Ok(token)
    }

    async fn transfer(
        &self,
        friend_id: String,
        sticker_ids: Vec<String>,
    ) -> Result<String, MintError> {
        let tx = format!("0xtx-{}", sticker_ids.len());
        self.transfers.lock().unwrap().push((friend_id, sticker_ids));
        Ok(tx)
    }
}

/// A running session over the Lausanne catalog.
pub struct TestSession {
    pub handle: SessionHandle,
    pub feed: LocationFeed,
    pub minter: Arc<RecordingMinter>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TestSession {
    pub fn start(permission: bool, store: Option<AlbumStore>) -> Result<Self> {
        Self::start_with(permission, store, Arc::new(RecordingMinter::default()))
    }

    pub fn start_with(
        permission: bool,
        store: Option<AlbumStore>,
        minter: Arc<RecordingMinter>,
    ) -> Result<Self> {
        let catalog = Arc::new(ZoneCatalog::lausanne());
        let ledger = match &store {
            Some(store) => CollectionLedger::hydrate(catalog, store.load()?)?,
            None => CollectionLedger::new(catalog),
        };
        let feed = LocationFeed::new(permission);
        let settings = SessionSettings {
            location_policy: zawya_session::location::LocationPolicy {
                attempts: 1,
                timeout: Duration::from_millis(50),
                max_fix_age: Duration::from_secs(30),
                fallback: Coordinate::new(46.5250, 6.6280),
            },
            ..SessionSettings::default()
        };
        let (session, handle) = Session::new(
            settings,
            ledger,
            Arc::new(feed.clone()),
            Arc::clone(&minter),
            store,
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(session.run(cancel.clone()));
        Ok(Self {
            handle,
            feed,
            minter,
            cancel,
            task,
        })
    }

    /// Publish a fix the way a device would, and push it to the session.
    pub async fn move_to(&self, coordinate: Coordinate) -> Result<()> {
        let fix = Fix::now(coordinate);
        self.feed.publish(fix);
        self.handle.location_changed(fix).await?;
        Ok(())
    }

    pub async fn wait_for_mint(&self, sticker_id: &str) -> Result<MintStatus> {
        for _ in 0..200 {
            let album = self.handle.album().await?;
            let entry = album
                .iter()
                .find(|e| e.sticker.sticker_id == sticker_id)
                .ok_or_else(|| anyhow::anyhow!("{sticker_id} not in album"))?;
            if entry.mint != MintStatus::Pending {
                return Ok(entry.mint.clone());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Err(anyhow::anyhow!("mint for {sticker_id} never settled"))
    }

    pub async fn shutdown(self) -> Result<()> {
        self.cancel.cancel();
        self.task.await?;
        Ok(())
    }
}

/// A fresh album path under the system temp dir.
pub fn temp_album(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("zawya_it_{}_{name}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}
