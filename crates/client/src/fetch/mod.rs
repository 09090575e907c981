//! Network seam for the cache worker.
//!
//! ### Contract
//! - [`Network::fetch`] returns `Ok` for every response the transport
//!   delivered, whatever its status. Deciding what a 404 means is the
//!   router's job.
//! - Transport failures and timeouts are `Error::Network`, the "network
//!   fetch failed" outcome that triggers cache fallback.
//! - Bodies are returned whole. The store decides what is too big to keep.
//!
//! ### HTTP implementation
//! - rustls, gzip/brotli/deflate decoding
//! - Max redirects: 5
//! - Request timeout: 20s (configurable); no other timeout is layered on top.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use shellcache_core::{AppConfig, Error, ResponseData, WorkerRequest};
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve};

/// Anything that can turn a request into a response over the network.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &WorkerRequest) -> Result<ResponseData, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
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
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

}

#[async_trait]
impl Network for HttpFetcher {
    async fn fetch(&self, request: &WorkerRequest) -> Result<ResponseData, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let response = self
            .http
            .request(method, request.url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Network(format!("timeout after {:?}: {}", self.config.timeout, request.url))
                } else {
                    Error::Network(format!("network error: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .filter(|(name, _)| name != header::SET_COOKIE.as_str())
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "fetched {} {} -> {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(ResponseData { url: final_url, status, headers, body })
    }
}
