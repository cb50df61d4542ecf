//! proxy_fetch tool implementation.
//!
//! Sends one request through the worker. Intercepted requests follow the
//! route's strategy; passthrough requests go straight to the network uncached.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::resolve;
use shellcache_client::{ProxyHandle, Served};
use shellcache_core::{Destination, ProxyRequest, Strategy};
use url::Url;

use super::json_result;
use crate::error::ToolError;

/// Bodies longer than this are cut in the tool output.
const MAX_BODY_CHARS: usize = 64 * 1024;

/// Parameters for the proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// Request destination: document, style, script, image, font or other.
    /// Inferred from the path extension when omitted.
    #[serde(default)]
    pub destination: Option<String>,

    /// HTTP method (default: GET). Only GET responses are cached.
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the proxy_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProxyFetchOutput {
    pub url: String,
    pub destination: Destination,
    /// `network`, `cache`, `synthetic` or `passthrough`.
    pub source: String,
    /// Strategy used; absent for passthrough.
    pub strategy: Option<Strategy>,
    /// 0 for the synthetic network error.
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
    pub body_truncated: bool,
}

impl ProxyFetchOutput {
    fn new(request: &ProxyRequest, served: Served, strategy: Option<Strategy>) -> Self {
        let mut body = served.response.body_text();
        let body_truncated = body.chars().count() > MAX_BODY_CHARS;
        if body_truncated {
            body = body.chars().take(MAX_BODY_CHARS).collect();
        }

        Self {
            url: request.url.to_string(),
            destination: request.destination,
            source: served.source.as_str().to_string(),
            strategy,
            status: served.response.status,
            status_text: served.response.status_text.clone(),
            content_type: served.response.content_type().map(str::to_string),
            body,
            body_truncated,
        }
    }
}

/// Build the request a tool call describes.
pub fn build_request(origin: &Url, params: &ProxyFetchParams) -> Result<ProxyRequest, ToolError> {
    let url = resolve(origin, &params.url)?;
    let destination = match params.destination.as_deref() {
        Some(tag) => Destination::parse(tag),
        None => Destination::infer(url.path()),
    };

    let mut request = ProxyRequest::get(url, destination);
    if let Some(method) = params.method.as_deref() {
        let method = method.trim();
        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ToolError::InvalidInput(format!("invalid method '{method}'")));
        }
        request = request.with_method(method);
    }

    Ok(request)
}

/// Implementation of the proxy_fetch tool.
pub async fn fetch_impl(proxy: &ProxyHandle, origin: &Url, params: ProxyFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(origin, &params)?;
    tracing::debug!(url = %request.url, destination = %request.destination, "proxy_fetch");

    let (served, strategy) = proxy.respond(request.clone()).await?;
    json_result(&ProxyFetchOutput::new(&request, served, strategy))
}
