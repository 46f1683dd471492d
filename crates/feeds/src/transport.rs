//! HTTP transport for the listing page and spreadsheet downloads.

use crate::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Fetches documents over the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a document as text (listing pages).
    async fn fetch_text(&self, url: &Url) -> Result<String, TransportError>;

    /// Fetch a document as raw bytes (spreadsheets).
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, TransportError>;
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification. Insecure: only for sources whose
    /// certificate chain does not validate.
    pub accept_invalid_certs: bool,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            user_agent: concat!("bcv-rate-bot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for rate source requests");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, TransportError> {
        debug!(%url, "GET");
        self.client
            .get(url.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| TransportError::from_reqwest(url, e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_text(&self, url: &Url) -> Result<String, TransportError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        debug!(%url, bytes = body.len(), "Downloaded");
        Ok(body.to_vec())
    }
}
