// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Anchor configuration plus the config service and storage port.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::submitter::SubmitterOptions;

/// Key under which [`AnchorConfig`] is stored.
pub const ANCHOR_CONFIG_KEY: &str = "anchor";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Thin service that serializes config values and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load the anchor config, falling back to defaults when none is stored.
    pub fn load_anchor(&self) -> Result<AnchorConfig, ConfigError> {
        Ok(self.load(ANCHOR_CONFIG_KEY)?.unwrap_or_default())
    }
}

/// Everything needed to reach the ledger and the record store.
///
/// Unknown fields are rejected so typos surface instead of silently using a
/// default. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    /// Ledger contract address (`0x` + 40 hex). Validated on connect.
    pub contract_address: String,
    /// JSON-RPC endpoint of the signing node.
    pub rpc_url: String,
    /// Sync endpoint of the off-chain record store.
    pub store_url: String,
    /// Page fetched to obtain the anti-forgery cookie when the jar has none.
    pub csrf_bootstrap_url: Option<String>,
    /// Cookie carrying the anti-forgery token.
    pub csrf_cookie_name: String,
    /// Header the token is echoed in.
    pub csrf_header_name: String,
    /// Finalization wait before a submission is reported as rejected.
    pub confirmation_timeout_secs: u64,
    /// Receipt polling interval for the JSON-RPC adapter.
    pub receipt_poll_interval_ms: u64,
    /// Status lines kept in history.
    pub status_history: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            store_url: "http://127.0.0.1:8000/blockchain/add_block/".to_string(),
            csrf_bootstrap_url: None,
            csrf_cookie_name: "csrftoken".to_string(),
            csrf_header_name: "X-CSRFToken".to_string(),
            confirmation_timeout_secs: 120,
            receipt_poll_interval_ms: 1000,
            status_history: 32,
        }
    }
}

impl AnchorConfig {
    /// Submitter options derived from this config.
    pub fn submitter_options(&self) -> SubmitterOptions {
        SubmitterOptions {
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
        }
    }

    /// Receipt polling interval.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
