//! Album snapshot persistence for restarts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use zawya_types::{CollectedSticker, CollectionLedger, MintStatus};

pub struct AlbumStore {
    path: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct StoredAlbum {
    version: u32,
    stickers: Vec<StoredSticker>,
}

#[derive(Serialize, Deserialize)]
struct StoredSticker {
    #[serde(flatten)]
    sticker: CollectedSticker,
    #[serde(default)]
    mint: Option<MintStatus>,
}

const SNAPSHOT_VERSION: u32 = 1;

impl AlbumStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, ledger: &CollectionLedger) -> Result<(), crate::Error> {
        let stored = StoredAlbum {
            version: SNAPSHOT_VERSION,
            stickers: ledger
                .stickers()
                .map(|s| StoredSticker {
                    sticker: s.clone(),
                    mint: ledger.mint_status(&s.sticker_id).cloned(),
                })
                .collect(),
        };

        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| crate::Error::Store(format!("Failed to serialize album: {e}")))?;

        // Atomic write: tmp + rename
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::Error::Store(format!("Failed to create album directory: {e}"))
            })?;
        }
        std::fs::write(&tmp, &json)
            .map_err(|e| crate::Error::Store(format!("Failed to write album: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| crate::Error::Store(format!("Failed to rename album: {e}")))?;

        info!(path = %self.path.display(), count = stored.stickers.len(), "Album saved");
        Ok(())
    }

    /// Load persisted records. A missing file is an empty album.
    pub fn load(&self) -> Result<Vec<(CollectedSticker, Option<MintStatus>)>, crate::Error> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No album found, starting fresh");
            return Ok(vec![]);
        }

        let data = std::fs::read(&self.path)
            .map_err(|e| crate::Error::Store(format!("Failed to read album: {e}")))?;
        let stored: StoredAlbum = serde_json::from_slice(&data)
            .map_err(|e| crate::Error::Store(format!("Failed to parse album: {e}")))?;
        if stored.version != SNAPSHOT_VERSION {
            return Err(crate::Error::Store(format!(
                "Unsupported album version {}",
                stored.version
            )));
        }

        info!(path = %self.path.display(), count = stored.stickers.len(), "Album loaded");
        Ok(stored
            .stickers
            .into_iter()
            .map(|s| (s.sticker, s.mint))
            .collect())
    }
}
