// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`RecordStorePort`] for a web backend that requires an anti-forgery token.
//!
//! The token lives in a cookie (by default `csrftoken`) and must be echoed in
//! a request header (by default `X-CSRFToken`). When the cookie jar holds no
//! token, the adapter fetches the configured bootstrap page once so the
//! backend can set it. Without a token nothing is posted.

use std::sync::Arc;

use pii_anchor_core::{AnchorConfig, RecordStorePort, StoreError, SyncAck, SyncEntry};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::csrf::cookie_value;

/// Endpoints and token names for [`HttpRecordStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Sync endpoint that receives the JSON array of entries.
    pub store_url: String,
    /// Page fetched to obtain the token cookie when the jar has none.
    pub bootstrap_url: Option<String>,
    /// Cookie carrying the token.
    pub cookie_name: String,
    /// Header the token is echoed in.
    pub header_name: String,
}

impl From<&AnchorConfig> for StoreSettings {
    fn from(config: &AnchorConfig) -> Self {
        Self {
            store_url: config.store_url.clone(),
            bootstrap_url: config.csrf_bootstrap_url.clone(),
            cookie_name: config.csrf_cookie_name.clone(),
            header_name: config.csrf_header_name.clone(),
        }
    }
}

/// HTTP record store with a private cookie jar.
pub struct HttpRecordStore {
    http: reqwest::Client,
    jar: Arc<Jar>,
    store_url: Url,
    bootstrap_url: Option<Url>,
    cookie_name: String,
    header_name: String,
}

fn parse_url(url: &str) -> Result<Url, StoreError> {
    Url::parse(url).map_err(|err| StoreError::Transport(format!("invalid url {url:?}: {err}")))
}

impl HttpRecordStore {
    /// Build the adapter; fails only on unparseable URLs.
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            jar,
            store_url: parse_url(&settings.store_url)?,
            bootstrap_url: settings.bootstrap_url.as_deref().map(parse_url).transpose()?,
            cookie_name: settings.cookie_name,
            header_name: settings.header_name,
        })
    }

    /// Seed the jar with a token obtained out of band (e.g. from a browser session).
    pub fn with_token(self, token: &str) -> Self {
        self.jar
            .add_cookie_str(&format!("{}={token}; Path=/", self.cookie_name), &self.store_url);
        self
    }

    /// Token currently in the jar for the sync endpoint.
    pub fn token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.store_url)?;
        cookie_value(header.to_str().ok()?, &self.cookie_name)
    }

    async fn obtain_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.token() {
            return Ok(token);
        }
        let missing = || StoreError::MissingCsrfToken(self.cookie_name.clone());
        let Some(bootstrap) = &self.bootstrap_url else {
            return Err(missing());
        };
        debug!(url = %bootstrap, "fetching anti-forgery cookie");
        let response = self
            .http
            .get(bootstrap.clone())
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        debug!(status = response.status().as_u16(), "bootstrap page answered");
        self.token().ok_or_else(missing)
    }
}

impl RecordStorePort for HttpRecordStore {
    async fn record_batch(&self, entries: &[SyncEntry]) -> Result<SyncAck, StoreError> {
        let token = self.obtain_token().await.inspect_err(|err| {
            warn!(error = %err, "not posting to record store");
        })?;
        let response = self
            .http
            .post(self.store_url.clone())
            .header(self.header_name.as_str(), token)
            .json(entries)
            .send()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(StoreError::Status { status, body });
        }
        info!(status, count = entries.len(), "record store accepted batch");
        Ok(SyncAck {
            status,
            body: (!body.is_empty()).then_some(body),
        })
    }
}
