//! Control messages from the controlling page, and sync tags.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shellcache_core::ProxySettings;

/// The only sync tag the worker acknowledges.
pub const SYNC_TAG: &str = "background-sync";

/// Recognised message payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// `{"type": "SKIP_WAITING"}`
    SkipWaiting,
    /// `{"type": "GET_VERSION"}`, answered on the reply port.
    GetVersion,
}

impl ClientMessage {
    /// Parse a payload. Anything unrecognised yields `None`.
    pub fn parse(data: &Value) -> Option<Self> {
        match data.get("type").and_then(Value::as_str)? {
            "SKIP_WAITING" => Some(ClientMessage::SkipWaiting),
            "GET_VERSION" => Some(ClientMessage::GetVersion),
            _ => None,
        }
    }
}

/// Reply to `GET_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionReply {
    pub version: String,
    pub cache_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_time: Option<String>,
}

impl VersionReply {
    pub fn from_settings(settings: &ProxySettings) -> Self {
        Self {
            version: settings.version_label().to_string(),
            cache_name: settings.cache_name(),
            build_time: settings.build_time.clone(),
        }
    }
}

/// Handle a sync event. Returns true when the tag was acknowledged.
pub fn handle_sync(tag: &str) -> bool {
    if tag == SYNC_TAG {
        tracing::info!("background sync triggered");
        true
    } else {
        tracing::debug!("ignoring sync tag {}", tag);
        false
    }
}
