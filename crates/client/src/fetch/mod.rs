//! HTTP fetch pipeline for the eCFR versioner API.
//!
//! ### Endpoints
//! - `GET {base}/api/versioner/v1/titles` lists every title with its latest
//!   issue date and reserved flag.
//! - `GET {base}/api/versioner/v1/full/{date}/title-{n}.xml` returns the
//!   full XML of one title as of an issue date.
//!
//! ### Failure mapping
//! - Transfer exceeded the timeout: `Error::Timeout`
//! - Transport failure or any status other than 200: `Error::Network`
//! - Title absent from the listing: `Error::NotFound`
//! - Title marked reserved: `Error::ReservedTitle`
//! - Listing not decodable: `Error::Parse`

pub mod titles;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use regcount_core::{Error, TitleMetadata};

pub use titles::TitlesResponse;

/// Source of title metadata and raw title documents.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Metadata for one title. Fails for reserved or unknown titles.
    async fn fetch_metadata(&self, title: u32) -> Result<TitleMetadata, Error>;

    /// Raw document for a title as of `issue_date`, which must come from
    /// [`fetch_metadata`](Self::fetch_metadata).
    async fn fetch_document(&self, title: u32, issue_date: &str) -> Result<String, Error>;

    /// The full upstream listing, reserved titles included.
    async fn fetch_titles(&self) -> Result<Vec<TitleMetadata>, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// API root (default: "https://www.ecfr.gov")
    pub base_url: String,

    /// User agent string (default: "regcount/0.1")
    pub user_agent: String,

    /// Request timeout (default: 30s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ecfr.gov".to_string(),
            user_agent: "regcount/0.1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&regcount_core::AppConfig> for FetchConfig {
    fn from(config: &regcount_core::AppConfig) -> Self {
        Self { base_url: config.base_url.clone(), user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// eCFR API client with per-title metadata memoisation.
pub struct EcfrClient {
    http: Client,
    config: FetchConfig,
    metadata: Mutex<HashMap<u32, TitleMetadata>>,
}

impl EcfrClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config, metadata: Mutex::new(HashMap::new()) })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Forget memoised title metadata so the next lookup hits the network.
    pub async fn clear_metadata_cache(&self) {
        self.metadata.lock().await.clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_bytes(&self, url: &str, accept: &str) -> Result<Bytes, Error> {
        let start = Instant::now();

        let response = self
            .http
            .get(url)
            .header("Accept", accept)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Network(format!("status {} for {}", status.as_u16(), url)));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_transport_error(url, e))?;

        tracing::debug!(url = %url, fetch_ms = start.elapsed().as_millis() as u64, bytes = bytes.len(), "fetched");
        Ok(bytes)
    }

    fn map_transport_error(&self, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(format!("{} exceeded {}ms", url, self.config.timeout.as_millis()))
        } else {
            Error::Network(format!("network error: {}", err))
        }
    }

    async fn load_titles(&self) -> Result<Vec<TitleMetadata>, Error> {
        let url = self.url("/api/versioner/v1/titles");
        let bytes = self.get_bytes(&url, "application/json").await?;
        let listing: TitlesResponse =
            serde_json::from_slice(&bytes).map_err(|e| Error::Parse(format!("titles listing: {}", e)))?;
        Ok(listing.titles)
    }
}

#[async_trait]
impl DocumentFetcher for EcfrClient {
    async fn fetch_metadata(&self, title: u32) -> Result<TitleMetadata, Error> {
        let cached = self.metadata.lock().await.get(&title).cloned();

        let meta = match cached {
            Some(meta) => meta,
            None => {
                let titles = self.load_titles().await?;
                let mut memo = self.metadata.lock().await;
                memo.extend(titles.into_iter().map(|t| (t.number, t)));
                memo.get(&title)
                    .cloned()
                    .ok_or_else(|| Error::NotFound(format!("title {} not found", title)))?
            }
        };

        if meta.reserved {
            return Err(Error::ReservedTitle(title));
        }
        Ok(meta)
    }

    async fn fetch_document(&self, title: u32, issue_date: &str) -> Result<String, Error> {
        let url = self.url(&format!("/api/versioner/v1/full/{}/title-{}.xml", issue_date, title));
        let bytes = self.get_bytes(&url, "application/xml").await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Always hits the network and refreshes the metadata memo.
    async fn fetch_titles(&self) -> Result<Vec<TitleMetadata>, Error> {
        let titles = self.load_titles().await?;
        self.metadata.lock().await.extend(titles.iter().map(|t| (t.number, t.clone())));
        tracing::debug!(titles = titles.len(), "loaded titles listing");
        Ok(titles)
    }
}
