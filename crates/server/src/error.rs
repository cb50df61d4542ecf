//! Structured errors raised by tool argument handling.
//!
//! Errors from the proxy itself use `shellcache_core::Error`.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use shellcache_client::fetch::UrlError;

/// Structured errors for tool arguments.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., unknown method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(#[from] UrlError),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::InvalidUrl(e) => (-32003, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
