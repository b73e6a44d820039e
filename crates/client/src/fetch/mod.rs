//! HTTP fetch pipeline.
//!
//! The worker talks to the network exclusively through the [`Network`]
//! trait so strategies can be tested against a fake. The production
//! implementation is [`HttpClient`], a thin reqwest wrapper with timeout,
//! redirect, and body-size limits.
//!
//! Non-success statuses and over-size bodies are reported as errors:
//! callers only ever cache 2xx snapshots, and every strategy treats any
//! fetch error as "network failed" and walks its fallback chain.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, resolve};

use shellcache_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

/// A GET request as the worker hands it to the network.
#[derive(Debug, Clone)]
pub struct NetworkRequest {
    /// Canonical absolute URL.
    pub url: Url,
    /// Accept header to forward, if the intercepted request carried one.
    pub accept: Option<String>,
    /// Ask intermediaries for a fresh copy (install-time precaching).
    pub no_cache: bool,
}

impl NetworkRequest {
    pub fn get(url: Url) -> Self {
        Self { url, accept: None, no_cache: false }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn fresh(mut self) -> Self {
        self.no_cache = true;
        self
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// The seam between the cache worker and the real network.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform a GET. Implementations must return an error for non-2xx
    /// statuses so callers never cache error pages.
    async fn fetch(&self, request: &NetworkRequest) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client with size and timeout limits.
pub struct HttpClient {
    http: Client,
    config: FetchConfig,
}

impl HttpClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpClient {
    async fn fetch(&self, request: &NetworkRequest) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = request.url.clone();

        let mut builder = self.http.get(url.as_str());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        if request.no_cache {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(url.to_string())
            } else {
                Error::HttpError(format!("network error: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, final_url, status, content_type, bytes, headers, fetch_ms })
    }
}
