//! cache_get tool implementation.
//!
//! Retrieves a stored response by request URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::resolve;
use shellcache_core::{CacheDb, CachedResponse, Error};
use url::Url;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Request URL, or a path resolved against the configured origin.
    pub url: String,

    /// Store to look in. All stores are searched, oldest first, when omitted.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_sha256: String,
    /// False when the stored body no longer matches its digest.
    pub intact: bool,
    pub stored_at: String,
}

impl From<CachedResponse> for CacheGetOutput {
    fn from(cached: CachedResponse) -> Self {
        let intact = cached.is_intact();
        Self {
            store: cached.store_name,
            url: cached.url,
            status: cached.response.status,
            status_text: cached.response.status_text.clone(),
            body: cached.response.body_text(),
            headers: cached.response.headers,
            body_sha256: cached.body_sha256,
            intact,
            stored_at: cached.stored_at,
        }
    }
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, origin: &Url, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve(origin, &params.url).map_err(ToolError::from)?;

    let cached = match params.store.as_deref() {
        Some(store) => cache.match_entry(store, url.as_str()).await?,
        None => cache.match_any(url.as_str()).await?,
    }
    .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    json_result(&CacheGetOutput::from(cached))
}
