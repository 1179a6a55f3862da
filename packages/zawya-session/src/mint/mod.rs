//! External mint collaborator.
//!
//! Minting is best-effort: the session dispatches it after the album entry
//! exists and records the outcome beside the entry without ever removing it.

mod rpc;

pub use rpc::JsonRpcMinter;

use serde::Serialize;
use std::fmt;
use std::future::Future;

/// Everything the chain needs to mint one sticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintRequest {
    pub sticker_id: String,
    pub zone_id: String,
    pub brand_name: String,
    pub quota: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MintError {
    /// Minting is switched off in configuration.
    Disabled,
    /// Both endpoints failed or returned a transport error.
    Rpc(String),
    /// The relay answered, but not with something we understand.
    Rejected(String),
}

impl fmt::Display for MintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MintError::Disabled => write!(f, "minting disabled"),
            MintError::Rpc(msg) => write!(f, "mint rpc error: {msg}"),
            MintError::Rejected(msg) => write!(f, "mint rejected: {msg}"),
        }
    }
}

impl std::error::Error for MintError {}

pub trait Minter: Send + Sync + 'static {
    /// Mint and return an opaque token reference.
    fn mint(&self, request: MintRequest) -> impl Future<Output = Result<String, MintError>> + Send;

    /// Send stickers to a friend. Returns a transaction reference.
    fn transfer(
        &self,
        friend_id: String,
        sticker_ids: Vec<String>,
    ) -> impl Future<Output = Result<String, MintError>> + Send;
}

/// Dev-mode minter: every call fails with [`MintError::Disabled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMinter;

impl Minter for DisabledMinter {
    async fn mint(&self, _request: MintRequest) -> Result<String, MintError> {
        Err(MintError::Disabled)
    }

    async fn transfer(
        &self,
        _friend_id: String,
        _sticker_ids: Vec<String>,
    ) -> Result<String, MintError> {
        Err(MintError::Disabled)
    }
}

/// Runtime-selected minter for the binary.
pub enum AnyMinter {
    Disabled(DisabledMinter),
    Rpc(JsonRpcMinter),
}

impl Minter for AnyMinter {
    async fn mint(&self, request: MintRequest) -> Result<String, MintError> {
        match self {
            AnyMinter::Disabled(m) => m.mint(request).await,
            AnyMinter::Rpc(m) => m.mint(request).await,
        }
    }

    async fn transfer(
        &self,
        friend_id: String,
        sticker_ids: Vec<String>,
    ) -> Result<String, MintError> {
        match self {
            AnyMinter::Disabled(m) => m.transfer(friend_id, sticker_ids).await,
            AnyMinter::Rpc(m) => m.transfer(friend_id, sticker_ids).await,
        }
    }
}
