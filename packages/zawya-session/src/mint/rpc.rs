//! JSON-RPC minter with primary → fallback failover.
//!
//! Signing happens behind the mint relay. This client submits the mint,
//! then polls the fullnode for the transaction's object changes to recover
//! the created sticker's object id.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{MintError, MintRequest, Minter};
use crate::config::MintConfig;

const CIRCUIT_BREAKER_THRESHOLD: u64 = 5;
const CIRCUIT_BREAKER_WINDOW: Duration = Duration::from_secs(30);

const STICKER_TYPE_SUFFIX: &str = "::stickers::Sticker";

struct CircuitState {
    failures: u64,
    last_failure: Option<Instant>,
}

pub struct JsonRpcMinter {
    http: reqwest::Client,
    primary_url: String,
    fallback_url: String,
    package_id: String,
    registry_id: String,
    poll_attempts: u32,
    poll_interval: Duration,
    circuit: Mutex<CircuitState>,
    next_id: AtomicU64,
    total_failovers: AtomicU64,
}

impl JsonRpcMinter {
    pub fn new(config: &MintConfig) -> Result<Self, crate::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| crate::Error::Config(format!("Failed to build HTTP client: {e}")))?;
        info!(
            primary = %config.rpc_url,
            fallback = %config.fallback_rpc_url,
            package = %config.package_id,
            "Mint RPC client initialized with failover"
        );
        Ok(Self {
            http,
            primary_url: config.rpc_url.clone(),
            fallback_url: config.fallback_rpc_url.clone(),
            package_id: config.package_id.clone(),
            registry_id: config.registry_id.clone(),
            poll_attempts: config.poll_attempts,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            circuit: Mutex::new(CircuitState {
                failures: 0,
                last_failure: None,
            }),
            next_id: AtomicU64::new(1),
            total_failovers: AtomicU64::new(0),
        })
    }

    pub fn failover_count(&self) -> u64 {
        self.total_failovers.load(Ordering::Relaxed)
    }

    /// Current preferred endpoint: fallback while the circuit is open.
    pub fn active_url(&self) -> &str {
        if self.circuit_open() {
            &self.fallback_url
        } else {
            &self.primary_url
        }
    }

    fn circuit_open(&self) -> bool {
        let circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures >= CIRCUIT_BREAKER_THRESHOLD
            && circuit
                .last_failure
                .is_some_and(|t| t.elapsed() < CIRCUIT_BREAKER_WINDOW)
    }

    fn record_success(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures = 0;
    }

    fn record_failure(&self) {
        let mut circuit = self.circuit.lock().unwrap_or_else(|e| e.into_inner());
        circuit.failures += 1;
        circuit.last_failure = Some(Instant::now());
    }

    /// One JSON-RPC call with automatic failover.
    async fn call(&self, method: &str, params: Value) -> Result<Value, MintError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let (first, second) = if self.circuit_open() {
            (&self.fallback_url, &self.primary_url)
        } else {
            (&self.primary_url, &self.fallback_url)
        };

        match self.post(first, &body).await {
            Ok(v) => {
                self.record_success();
                Ok(v)
            }
            Err(MintError::Rejected(msg)) => Err(MintError::Rejected(msg)),
            Err(e) => {
                self.record_failure();
                self.total_failovers.fetch_add(1, Ordering::Relaxed);
                warn!(method, error = %e, "Primary mint RPC failed, trying fallback");
                self.post(second, &body).await.map_err(|e2| {
                    MintError::Rpc(format!("{method} failed on both RPCs: first={e}, second={e2}"))
                })
            }
        }
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, MintError> {
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| MintError::Rpc(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(MintError::Rpc(format!("HTTP {}", resp.status())));
        }
        let value: Value = resp
            .json()
            .await
            .map_err(|e| MintError::Rpc(format!("invalid JSON: {e}")))?;
        rpc_result(value)
    }

    async fn created_sticker(&self, digest: &str) -> Option<String> {
        for attempt in 1..=self.poll_attempts {
            let params = json!([digest, { "showEffects": true, "showObjectChanges": true }]);
            match self.call("sui_getTransactionBlock", params).await {
                Ok(result) => {
                    if let Some(object_id) = created_object_id(&result, STICKER_TYPE_SUFFIX) {
                        return Some(object_id);
                    }
                    debug!(digest, attempt, "Transaction found but no sticker object yet");
                }
                Err(e) => debug!(digest, attempt, error = %e, "Transaction not yet visible"),
            }
            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        None
    }
}

impl Minter for JsonRpcMinter {
    async fn mint(&self, request: MintRequest) -> Result<String, MintError> {
        let params = json!({
            "package_id": self.package_id,
            "registry_id": self.registry_id,
            "sticker_id": request.sticker_id,
            "zone_id": request.zone_id,
            "brand_name": request.brand_name,
            "quota": request.quota,
        });
        let result = self.call("zawya_mintSticker", params).await?;
        let digest = transaction_digest(&result)?;
        info!(sticker = %request.sticker_id, digest = %digest, "Mint submitted");

        match self.created_sticker(&digest).await {
            Some(object_id) => Ok(object_id),
            None => {
                warn!(digest = %digest, "Sticker object not found, keeping digest as reference");
                Ok(format!("digest:{digest}"))
            }
        }
    }

    async fn transfer(
        &self,
        friend_id: String,
        sticker_ids: Vec<String>,
    ) -> Result<String, MintError> {
        let params = json!({
            "package_id": self.package_id,
            "friend_id": friend_id,
            "sticker_ids": sticker_ids,
        });
        let result = self.call("zawya_transferStickers", params).await?;
        transaction_digest(&result)
    }
}

/// Unwrap a JSON-RPC envelope. An `error` member is a rejection, not a transport failure.
fn rpc_result(mut envelope: Value) -> Result<Value, MintError> {
    if let Some(err) = envelope.get("error").filter(|e| !e.is_null()) {
        let msg = err
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(MintError::Rejected(msg));
    }
    match envelope.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(MintError::Rpc("response has neither result nor error".into())),
    }
}

/// Accepts `"digest"` or `{"digest": "..."}`.
fn transaction_digest(result: &Value) -> Result<String, MintError> {
    result
        .as_str()
        .or_else(|| result.get("digest").and_then(Value::as_str))
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .ok_or_else(|| MintError::Rejected(format!("no transaction digest in {result}")))
}

/// Object id of the first created object whose type ends with `type_suffix`.
fn created_object_id(tx_block: &Value, type_suffix: &str) -> Option<String> {
    tx_block
        .get("objectChanges")?
        .as_array()?
        .iter()
        .find(|change| {
            change.get("type").and_then(Value::as_str) == Some("created")
                && change
                    .get("objectType")
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.ends_with(type_suffix))
        })
        .and_then(|change| change.get("objectId"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
