//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the proxy worker and the cache tools.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl, stores_impl};
use crate::tools::proxy_fetch::{ProxyFetchParams, fetch_impl};
use crate::tools::proxy_lifecycle::{activate_impl, install_impl, state_impl};
use crate::tools::proxy_message::{ProxyMessageParams, ProxySyncParams, message_impl, sync_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::ProxyHandle;
use shellcache_core::{CacheDb, ProxySettings};

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellcacheServer {
    tool_router: ToolRouter<Self>,
    proxy: ProxyHandle,
    cache: CacheDb,
    settings: Arc<ProxySettings>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellcacheServer {
    /// Create a new server handler.
    pub fn new(proxy: ProxyHandle, cache: CacheDb, settings: ProxySettings) -> Self {
        Self { tool_router: Self::tool_router(), proxy, cache, settings: Arc::new(settings) }
    }

    #[tool(description = "Run the install phase: precache the app shell into the current store. \
                          Activates immediately when skip-waiting is enabled.")]
    async fn proxy_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.proxy).await
    }

    #[tool(description = "Run the activate phase: delete stale stores and start intercepting fetches.")]
    async fn proxy_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.proxy).await
    }

    #[tool(description = "Report the worker lifecycle state.")]
    async fn proxy_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.proxy).await
    }

    /// Fetch a URL through the caching proxy.
    ///
    /// Returns the response together with where it came from (network, cache,
    /// synthetic or passthrough) and the strategy that served it.
    #[tool(description = "Fetch a URL through the caching proxy. Returns status, body and the response source.")]
    async fn proxy_fetch(&self, params: Parameters<ProxyFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.proxy, &self.settings.origin, params.0).await
    }

    #[tool(description = "Post a message to the worker, e.g. {\"type\":\"GET_VERSION\"} or {\"type\":\"SKIP_WAITING\"}.")]
    async fn proxy_message(&self, params: Parameters<ProxyMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.proxy, params.0).await
    }

    #[tool(description = "Deliver a background sync event with the given tag.")]
    async fn proxy_sync(&self, params: Parameters<ProxySyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.proxy, params.0).await
    }

    #[tool(description = "List named cache stores with their entry counts.")]
    async fn cache_stores(&self) -> Result<CallToolResult, McpError> {
        stores_impl(&self.cache, &self.settings).await
    }

    #[tool(description = "Retrieve a stored response by URL, optionally from one named store.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, &self.settings.origin, params.0).await
    }

    #[tool(description = "Delete a named store, or every stale store with stale=true.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, &self.settings, params.0).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Caching proxy for {} (store {}). Install, then fetch through proxy_fetch.",
                self.settings.origin,
                self.settings.cache_name()
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
