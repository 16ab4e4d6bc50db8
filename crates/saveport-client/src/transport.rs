//! HTTP transport to the sync server
//!
//! A thin wrapper over one `reqwest` client. Every request carries the
//! authentication headers; bundles move as octet-streams and everything
//! else as JSON. The transport performs no retries: a failed round-trip
//! surfaces as-is and retry policy stays with the caller.

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    HistoryResponse, NamesRequest, NamesResponse, SaveMeta, SaveVersion, SyncPlan, SyncRequest,
    UpdateInfo,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use saveport_formats::TitleId;
use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, trace};

/// All endpoints live under this prefix
const API_PREFIX: &str = "/api/v1";

/// User agent reported on every request
const USER_AGENT: &str = concat!("saveport/", env!("CARGO_PKG_VERSION"));

/// Install the process-wide rustls crypto provider once
fn ensure_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP client for the sync server
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    api_key: String,
    console_id: String,
}

impl Transport {
    /// Create a transport from the engine configuration
    pub fn new(config: &ClientConfig) -> SyncResult<Self> {
        ensure_crypto_provider();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            console_id: config.console_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-API-Key", &self.api_key)
            .header("X-Console-ID", &self.console_id)
            .header("User-Agent", USER_AGENT)
    }

    async fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let response = self.with_headers(request).send().await?;
        trace!("response status: {}", response.status());
        Ok(response)
    }

    /// Download a title's current bundle; any non-200 is a server error
    pub async fn download_bundle(&self, title_id: TitleId) -> SyncResult<Vec<u8>> {
        let url = self.url(&format!("/saves/{title_id}"));
        debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            status => Err(SyncError::Server(status)),
        }
    }

    /// Upload a title's bundle
    pub async fn upload_bundle(&self, title_id: TitleId, body: Vec<u8>) -> SyncResult<()> {
        let url = self.url(&format!("/saves/{title_id}"));
        debug!("POST {url} ({} bytes)", body.len());
        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(body);
        let response = self.send(request).await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(SyncError::Server(status)),
        }
    }

    /// Fetch a title's server-side metadata; 404 means no server copy
    pub async fn save_meta(&self, title_id: TitleId) -> SyncResult<Option<SaveMeta>> {
        let url = self.url(&format!("/saves/{title_id}/meta"));
        debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.json().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(SyncError::Server(status)),
        }
    }

    /// List a title's stored save versions
    pub async fn history(&self, title_id: TitleId) -> SyncResult<Vec<SaveVersion>> {
        let url = self.url(&format!("/saves/{title_id}/history"));
        debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => {
                let body: HistoryResponse = response.json().await?;
                Ok(body.versions)
            }
            status => Err(SyncError::Server(status)),
        }
    }

    /// Download one historical bundle by its timestamp
    pub async fn history_bundle(&self, title_id: TitleId, timestamp: u64) -> SyncResult<Vec<u8>> {
        let url = self.url(&format!("/saves/{title_id}/history/{timestamp}"));
        debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            status => Err(SyncError::Server(status)),
        }
    }

    /// Submit the batch report and receive the server's plan
    pub async fn sync_plan(&self, request: &SyncRequest) -> SyncResult<SyncPlan> {
        let url = self.url("/sync");
        debug!("POST {url} ({} titles)", request.titles.len());
        let response = self.send(self.client.post(&url).json(request)).await?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status => Err(SyncError::Server(status)),
        }
    }

    /// Resolve product codes to human-readable names
    pub async fn lookup_names(&self, codes: &[String]) -> SyncResult<HashMap<String, String>> {
        let url = self.url("/titles/names");
        debug!("POST {url} ({} codes)", codes.len());
        let body = NamesRequest {
            codes: codes.to_vec(),
        };
        let response = self.send(self.client.post(&url).json(&body)).await?;
        match response.status() {
            StatusCode::OK => {
                let body: NamesResponse = response.json().await?;
                Ok(body.names)
            }
            status => Err(SyncError::Server(status)),
        }
    }

    /// Ask the server whether a newer client exists
    pub async fn check_update(&self, current: &str) -> SyncResult<UpdateInfo> {
        let url = format!("{}?current={current}", self.url("/update/check"));
        debug!("GET {url}");
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status => Err(SyncError::Server(status)),
        }
    }
}
