//! HTTP network access for the proxy.
//!
//! ### Network trait
//! The worker only sees [`Network`], so strategies can be driven by the real
//! reqwest client or by a stub in tests.
//!
//! ### Failure model
//! - Any non-2xx status is a *response*, not an error.
//! - Connection, DNS, timeout and oversize failures are errors; the strategies
//!   treat every error from [`Network::fetch`] as "the network is unavailable".
//! - Max redirects: 5; max body bytes and timeout are configurable.

pub mod url;

use reqwest::{Client, Method};
use std::time::{Duration, Instant};

pub use url::{UrlError, resolve};

use shellcache_core::{AppConfig, Error, ProxyRequest, ProxyResponse, ResponseKind};

/// Something that can perform a live fetch.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Fetch `request` from the network.
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
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
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
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
}

fn classify_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::HttpError(format!("network error: {}", err))
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(classify_error)?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let status = response.status();
        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = response.bytes().await.map_err(classify_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(ProxyResponse {
            url: final_url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: bytes.to_vec(),
            kind: ResponseKind::Basic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellcache_core::Destination;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "test/1".into(), timeout_ms: 500, max_bytes: 42, ..Default::default() };
        let config = FetchConfig::from_app_config(&app);
        assert_eq!(config.user_agent, "test/1");
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.max_bytes, 42);
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        let client = FetchClient::new(FetchConfig { timeout: Duration::from_millis(500), ..Default::default() }).unwrap();
        // port 9 (discard) on loopback is closed in test environments
        let url = ::url::Url::parse("http://127.0.0.1:9/").unwrap();
        let result = client.fetch(&ProxyRequest::get(url, Destination::Document)).await;
        assert!(matches!(result, Err(e) if e.is_network()));
    }
}
