//! proxy_install / proxy_activate / proxy_state tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ProxyHandle;

use super::json_result;

/// Output from the proxy_state tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StateOutput {
    /// `parsed`, `installing`, `installed`, `activating`, `activated` or `redundant`.
    pub state: String,
}

/// Implementation of the proxy_install tool.
///
/// A failed precache is returned as an error and leaves the worker redundant.
pub async fn install_impl(proxy: &ProxyHandle) -> Result<CallToolResult, McpError> {
    let report = proxy.install().await?;
    json_result(&report)
}

/// Implementation of the proxy_activate tool.
pub async fn activate_impl(proxy: &ProxyHandle) -> Result<CallToolResult, McpError> {
    let report = proxy.activate().await?;
    json_result(&report)
}

/// Implementation of the proxy_state tool.
pub async fn state_impl(proxy: &ProxyHandle) -> Result<CallToolResult, McpError> {
    let state = proxy.state().await?;
    json_result(&StateOutput { state: state.as_str().to_string() })
}
