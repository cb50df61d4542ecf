//! Network-first and cache-first strategies.
//!
//! Network failures never escape a strategy: they become a store fallback or
//! the synthetic network-error response. Store reads that fail do escape.
//! Store writes that fail are logged and the live response is still returned.

use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error, ProxyRequest, ProxyResponse, StoreKind};

use crate::fetch::Network;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Network failed and nothing was stored.
    Synthetic,
    /// Not intercepted; fetched directly.
    Passthrough,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Synthetic => "synthetic",
            ResponseSource::Passthrough => "passthrough",
        }
    }
}

/// A response plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: ProxyResponse,
    pub source: ResponseSource,
}

impl Served {
    fn network(response: ProxyResponse) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    fn cache(response: ProxyResponse) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    pub(crate) fn synthetic() -> Self {
        Self { response: ProxyResponse::network_error(), source: ResponseSource::Synthetic }
    }
}

/// What a strategy needs: the store to write into and the two handles.
pub struct StrategyContext<'a> {
    pub cache: &'a CacheDb,
    pub network: &'a dyn Network,
    pub store_name: &'a str,
    pub store_kind: StoreKind,
    pub store_version: &'a str,
}

impl StrategyContext<'_> {
    /// Open the target store and put a copy of `response` under the request key.
    async fn store(&self, request: &ProxyRequest, response: &ProxyResponse) {
        if !request.is_cacheable() {
            tracing::debug!("not storing {} {}: method not cacheable", request.method, request.url);
            return;
        }

        let result = async {
            self.cache
                .open_store(self.store_name, self.store_kind, self.store_version)
                .await?;
            self.cache
                .put_entry(self.store_name, request.cache_key(), response)
                .await
        }
        .await;

        match result {
            Ok(()) => tracing::debug!("stored {} in {}", request.url, self.store_name),
            Err(e) => tracing::warn!(store = self.store_name, url = %request.url, "failed to store response: {}", e),
        }
    }

    async fn lookup(&self, request: &ProxyRequest) -> Result<Option<ProxyResponse>, Error> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        Ok(self
            .cache
            .match_any(request.cache_key())
            .await?
            .map(|cached| cached.response))
    }
}

/// Log a failed fetch before falling back.
fn log_network_failure(request: &ProxyRequest, err: &Error) {
    if err.is_network() {
        tracing::debug!("network failed for {}, falling back: {}", request.url, err);
    } else {
        tracing::warn!(url = %request.url, "fetch failed with a non-network error, falling back: {}", err);
    }
}

/// Prefer a live response; fall back to the store, then to a synthetic error.
pub async fn network_first(ctx: &StrategyContext<'_>, request: &ProxyRequest) -> Result<Served, Error> {
    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_ok() {
                ctx.store(request, &response).await;
            }
            Ok(Served::network(response))
        }
        Err(e) => {
            log_network_failure(request, &e);
            match ctx.lookup(request).await? {
                Some(response) => Ok(Served::cache(response)),
                None => Ok(Served::synthetic()),
            }
        }
    }
}

/// Prefer a stored response; on a miss fetch, store and return.
pub async fn cache_first(ctx: &StrategyContext<'_>, request: &ProxyRequest) -> Result<Served, Error> {
    if let Some(response) = ctx.lookup(request).await? {
        tracing::debug!("cache hit for {}", request.url);
        return Ok(Served::cache(response));
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            if response.is_ok() {
                ctx.store(request, &response).await;
            }
            Ok(Served::network(response))
        }
        Err(e) => {
            log_network_failure(request, &e);
            Ok(Served::synthetic())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubNetwork;
    use shellcache_core::Destination;
    use url::Url;

    const STORE: &str = "app-1";

    fn ctx<'a>(cache: &'a CacheDb, network: &'a StubNetwork) -> StrategyContext<'a> {
        StrategyContext { cache, network, store_name: STORE, store_kind: StoreKind::AppShell, store_version: "1" }
    }

    fn request(url: &str, destination: Destination) -> ProxyRequest {
        ProxyRequest::get(Url::parse(url).unwrap(), destination)
    }

    #[tokio::test]
    async fn test_network_first_stores_success() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new().with_response("https://example.com/", 200, "<html>home</html>");
        let req = request("https://example.com/", Destination::Document);

        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body_text(), "<html>home</html>");

        let stored = cache.match_entry(STORE, "https://example.com/").await.unwrap().unwrap();
        assert_eq!(stored.response.body, served.response.body);
    }

    #[tokio::test]
    async fn test_network_first_does_not_store_errors() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new().with_response("https://example.com/gone", 500, "oops");
        let req = request("https://example.com/gone", Destination::Document);

        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.response.status, 500);
        assert_eq!(served.source, ResponseSource::Network);
        assert!(cache.match_any("https://example.com/gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new().with_response("https://example.com/", 200, "fresh");
        let req = request("https://example.com/", Destination::Document);
        network_first(&ctx(&cache, &network), &req).await.unwrap();

        network.set_offline(true);
        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body_text(), "fresh");
    }

    #[tokio::test]
    async fn test_network_first_offline_without_cache_is_synthetic() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        network.set_offline(true);
        let req = request("https://example.com/about", Destination::Document);

        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Synthetic);
        assert!(served.response.is_network_error());
        assert_eq!(served.response.status, 0);
    }

    #[tokio::test]
    async fn test_cache_first_scenario() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/assets/index.css";
        let network = StubNetwork::new().with_response(url, 200, "body{}");
        let req = request(url, Destination::Style);

        let first = cache_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(network.call_count(url), 1);

        let second = cache_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.body_text(), "body{}");
        assert_eq!(network.call_count(url), 1);
    }

    #[tokio::test]
    async fn test_cache_first_hits_any_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/logo.png";
        cache.open_store("app-0", StoreKind::AppShell, "0").await.unwrap();
        cache
            .put_entry("app-0", url, &ProxyResponse::new(url, 200, "png"))
            .await
            .unwrap();
        let network = StubNetwork::new();

        let served = cache_first(&ctx(&cache, &network), &request(url, Destination::Image))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_offline_miss_is_synthetic() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new();
        network.set_offline(true);

        let served = cache_first(&ctx(&cache, &network), &request("https://example.com/f.woff2", Destination::Font))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Synthetic);
    }

    #[tokio::test]
    async fn test_cache_first_ignores_fragment() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/assets/a.css";
        let network = StubNetwork::new().with_response(url, 200, "a{}");
        cache_first(&ctx(&cache, &network), &request(url, Destination::Style))
            .await
            .unwrap();

        let served = cache_first(&ctx(&cache, &network), &request("https://example.com/assets/a.css#x", Destination::Style))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body_text(), "a{}");
        assert_eq!(network.calls().len(), 1);
        assert_eq!(cache.entry_urls(STORE).await.unwrap(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_network_first_stores_without_fragment() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new().with_response("https://example.com/about#team", 200, "about");
        let req = request("https://example.com/about#team", Destination::Document);

        network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(cache.entry_urls(STORE).await.unwrap(), vec!["https://example.com/about".to_string()]);
    }

    #[tokio::test]
    async fn test_non_get_is_never_stored() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/form";
        let network = StubNetwork::new().with_response(url, 200, "ok");
        let req = request(url, Destination::Other).with_method("POST");

        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert!(cache.match_any(url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_live_response() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let network = StubNetwork::new().with_response("https://example.com/", 200, "live");
        let req = request("https://example.com/", Destination::Document);
        let closed = cache.clone();
        closed.close().await.unwrap();

        let served = network_first(&ctx(&cache, &network), &req).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body_text(), "live");
    }
}
