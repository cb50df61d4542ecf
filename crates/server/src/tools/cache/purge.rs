//! cache_purge tool implementation.
//!
//! Deletes a named store, or every store that is not current.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error, ProxySettings};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete this store by name.
    #[serde(default)]
    pub store: Option<String>,

    /// Delete every store that is not current, as activation would.
    #[serde(default)]
    pub stale: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Names of the deleted stores.
    pub deleted: Vec<String>,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(
    cache: &CacheDb, settings: &ProxySettings, params: CachePurgeParams,
) -> Result<CallToolResult, McpError> {
    if params.store.is_none() && !params.stale {
        return Err(Error::InvalidInput("At least one of store or stale must be specified".to_string()).into());
    }

    let mut deleted = Vec::new();

    if let Some(store) = params.store
        && cache.delete_store(&store).await?
    {
        deleted.push(store);
    }

    if params.stale {
        deleted.extend(cache.delete_stores_except(&settings.current_store_names()).await?);
    }

    for name in &deleted {
        tracing::info!("purged store {}", name);
    }

    json_result(&CachePurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use serde_json::{Value, json};
    use shellcache_core::{AppConfig, StoreKind};

    fn text(result: &CallToolResult) -> Value {
        match &result.content[0].raw {
            RawContent::Text(t) => serde_json::from_str(&t.text).unwrap(),
            _ => panic!("expected text content"),
        }
    }

    fn settings() -> ProxySettings {
        let config = AppConfig { app_name: "app".into(), version: "3".into(), ..Default::default() };
        ProxySettings::from_config(&config).unwrap()
    }

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        for name in ["app-1", "app-2", "app-3"] {
            cache.open_store(name, StoreKind::AppShell, "x").await.unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_purge_requires_params() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CachePurgeParams { store: None, stale: false };

        let err = purge_impl(&cache, &settings(), params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_purge_named_store() {
        let cache = seeded().await;
        let params = CachePurgeParams { store: Some("app-1".into()), stale: false };

        let out = text(&purge_impl(&cache, &settings(), params).await.unwrap());
        assert_eq!(out["deleted"], json!(["app-1"]));

        let params = CachePurgeParams { store: Some("app-1".into()), stale: false };
        let out = text(&purge_impl(&cache, &settings(), params).await.unwrap());
        assert_eq!(out["deleted"], json!([]));
    }

    #[tokio::test]
    async fn test_purge_stale_keeps_current() {
        let cache = seeded().await;
        let params = CachePurgeParams { store: None, stale: true };

        let out = text(&purge_impl(&cache, &settings(), params).await.unwrap());
        assert_eq!(out["deleted"], json!(["app-1", "app-2"]));
        assert_eq!(cache.store_names().await.unwrap(), vec!["app-3".to_string()]);
    }
}
