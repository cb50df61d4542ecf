//! cache_stores tool implementation.
//!
//! Lists every named store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, ProxySettings, StoreInfo};

use crate::tools::json_result;

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Stores in creation order.
    pub stores: Vec<StoreInfo>,
    /// Names that survive the next activation.
    pub current: Vec<String>,
    /// Version currently recorded as active, if any.
    pub active_version: Option<String>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(cache: &CacheDb, settings: &ProxySettings) -> Result<CallToolResult, McpError> {
    let stores = cache.list_stores().await?;
    let active_version = cache.registration().await?.map(|r| r.active_version);

    json_result(&CacheStoresOutput { stores, current: settings.current_store_names(), active_version })
}
