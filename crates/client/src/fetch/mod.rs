//! HTTP network capability.
//!
//! ### Contract
//! - One operation: request in, response or failure out
//! - Every response that arrives is a success, whatever its status
//! - Only transport failures (DNS, connect, TLS, timeout, body read) are errors
//!
//! ### Limits
//! - Max redirects: 5
//! - Request timeout: 20s (configurable). A fetch that never resolves would
//!   otherwise hang the strategy waiting on it.

pub mod error;
pub mod url;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use error::NetworkError;
pub use url::{UrlError, resolve_asset};

use swcache_core::{Headers, Request, Response, WorkerConfig};

/// The network capability consumed by the caching strategies.
#[async_trait]
pub trait Network: Send + Sync {
    /// Issue a request and return whatever response arrives.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "swcache/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&WorkerConfig> for FetchConfig {
    fn from(config: &WorkerConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// HTTP implementation of [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| NetworkError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(format!("{}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = capture_headers(response.headers());

        let body = response.bytes().await.map_err(|e| NetworkError::Body(e.to_string()))?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().map(String::from),
            headers,
            body,
        })
    }
}

/// Copy every response header; bytes that are not valid UTF-8 are replaced
/// rather than the header being dropped.
fn capture_headers(map: &HeaderMap) -> Headers {
    map.iter()
        .map(|(name, value)| (name.as_str(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        .collect()
}
