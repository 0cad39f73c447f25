// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Standard "method not found" error code.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// EIP-1193 "user rejected request" code.
pub const USER_REJECTED: i64 = 4001;

/// Failures of a single JSON-RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Request could not be delivered or the response body not read.
    #[error("rpc transport: {0}")]
    Transport(String),
    /// Node answered with a non-success HTTP status.
    #[error("rpc http status {0}")]
    Http(u16),
    /// Node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// Node-supplied message.
        message: String,
    },
    /// Result did not have the expected shape.
    #[error("rpc decode: {0}")]
    Decode(String),
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Value,
    error: Option<ErrorObject>,
}

/// HTTP JSON-RPC client with monotonically increasing request ids.
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: reqwest::Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Client for the endpoint at `url`.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| RpcError::Transport(format!("invalid rpc url {url:?}: {err}")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| RpcError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// Endpoint this client talks to.
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// Call `method` with positional `params` and decode the result.
    ///
    /// A missing `result` decodes as JSON `null`, so `T = Option<_>` covers
    /// "not yet available" answers.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "rpc call");
        let response = self
            .http
            .post(self.url.clone())
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|err| RpcError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(status.as_u16()));
        }
        let body: Response = response
            .json()
            .await
            .map_err(|err| RpcError::Decode(err.to_string()))?;
        if let Some(err) = body.error {
            debug!(id, method, code = err.code, "rpc error");
            return Err(RpcError::Server {
                code: err.code,
                message: err.message,
            });
        }
        serde_json::from_value(body.result).map_err(|err| RpcError::Decode(err.to_string()))
    }
}
