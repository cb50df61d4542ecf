//! proxy_message and proxy_sync tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellcache_client::{ProxyHandle, VersionReply};

use super::json_result;

/// Parameters for the proxy_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyMessageParams {
    /// Message payload, e.g. `{"type": "GET_VERSION"}` or `{"type": "SKIP_WAITING"}`.
    pub data: Value,
}

/// Output from the proxy_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyMessageOutput {
    /// Reply posted on the message port, if the worker answered.
    pub reply: Option<Value>,
    /// Worker state after the message was handled.
    pub state: String,
}

/// Parameters for the proxy_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxySyncParams {
    /// Sync tag. Only `background-sync` is acknowledged.
    pub tag: String,
}

/// Output from the proxy_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxySyncOutput {
    pub tag: String,
    pub acknowledged: bool,
}

fn reply_value(reply: VersionReply) -> Option<Value> {
    serde_json::to_value(reply).ok()
}

/// Implementation of the proxy_message tool.
///
/// Every message is posted with a reply port; unrecognised payloads get no reply.
pub async fn message_impl(proxy: &ProxyHandle, params: ProxyMessageParams) -> Result<CallToolResult, McpError> {
    let reply = proxy.post_message_with_reply(params.data).await?;
    let state = proxy.state().await?;

    json_result(&ProxyMessageOutput { reply: reply.and_then(reply_value), state: state.as_str().to_string() })
}

/// Implementation of the proxy_sync tool.
pub async fn sync_impl(proxy: &ProxyHandle, params: ProxySyncParams) -> Result<CallToolResult, McpError> {
    let acknowledged = proxy.sync(&params.tag).await?;
    json_result(&ProxySyncOutput { tag: params.tag, acknowledged })
}
