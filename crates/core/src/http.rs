//! Request and response model shared by the store, the network client and the worker.
//!
//! ### Destinations
//! A request carries the kind of resource it loads (`document`, `style`, ...),
//! the same tag a browser attaches to a fetch. Callers that only have a URL can
//! use [`Destination::infer`] to guess it from the path extension.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Position, Url};

/// What an intercepted request is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level HTML navigation.
    Document,
    Style,
    Script,
    Image,
    Font,
    /// Anything else, including requests with no destination (`fetch()` from script).
    #[default]
    Other,
}

impl Destination {
    /// Parse a destination tag. Unknown or empty tags map to `Other`.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "style" => Destination::Style,
            "script" | "worker" | "sharedworker" => Destination::Script,
            "image" => Destination::Image,
            "font" => Destination::Font,
            _ => Destination::Other,
        }
    }

    /// Guess a destination from a URL path.
    ///
    /// Paths ending in `/` or `.html` are documents; known asset extensions map
    /// to their kind; everything else is `Other`.
    pub fn infer(path: &str) -> Self {
        if path.is_empty() || path.ends_with('/') {
            return Destination::Document;
        }

        let file = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = file.rsplit_once('.') else {
            return Destination::Other;
        };

        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Destination::Document,
            "css" => Destination::Style,
            "js" | "mjs" => Destination::Script,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => Destination::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Destination::Font,
            _ => Destination::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Style => "style",
            Destination::Script => "script",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Other => "other",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request seen by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub url: Url,
    /// Upper-case HTTP method.
    pub method: String,
    pub destination: Destination,
}

impl ProxyRequest {
    /// A `GET` request for `url`.
    pub fn get(url: Url, destination: Destination) -> Self {
        Self { url, method: "GET".into(), destination }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    /// Only `GET` requests are stored or matched.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// The store key for this request: the URL without its fragment.
    pub fn cache_key(&self) -> &str {
        &self.url[..Position::AfterQuery]
    }
}

/// Distinguishes real responses from the synthetic network error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Basic,
    Error,
}

/// A response returned to the intercepting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProxyResponse {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub kind: ResponseKind,
}

impl ProxyResponse {
    /// A plain response with no headers.
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            status_text: String::new(),
            headers: Vec::new(),
            body: body.into(),
            kind: ResponseKind::Basic,
        }
    }

    /// The synthetic network-error response: status 0, no body.
    pub fn network_error() -> Self {
        Self {
            url: String::new(),
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: Vec::new(),
            kind: ResponseKind::Error,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        self.kind == ResponseKind::Basic && (200..300).contains(&self.status)
    }

    pub fn is_network_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body decoded as UTF-8, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("document"), Destination::Document);
        assert_eq!(Destination::parse("STYLE"), Destination::Style);
        assert_eq!(Destination::parse("font"), Destination::Font);
        assert_eq!(Destination::parse("script"), Destination::Script);
        assert_eq!(Destination::parse(""), Destination::Other);
        assert_eq!(Destination::parse("manifest"), Destination::Other);
    }

    #[test]
    fn test_destination_infer() {
        assert_eq!(Destination::infer("/"), Destination::Document);
        assert_eq!(Destination::infer("/app/index.html"), Destination::Document);
        assert_eq!(Destination::infer("/assets/index.css"), Destination::Style);
        assert_eq!(Destination::infer("/assets/index.js"), Destination::Script);
        assert_eq!(Destination::infer("/img/logo.SVG"), Destination::Image);
        assert_eq!(Destination::infer("/fonts/inter.woff2"), Destination::Font);
        assert_eq!(Destination::infer("/manifest.json"), Destination::Other);
        assert_eq!(Destination::infer("/v1.2/users"), Destination::Other);
    }

    #[test]
    fn test_destination_serde() {
        let json = serde_json::to_string(&Destination::Image).unwrap();
        assert_eq!(json, "\"image\"");
        let parsed: Destination = serde_json::from_str("\"document\"").unwrap();
        assert_eq!(parsed, Destination::Document);
    }

    #[test]
    fn test_request_cacheable() {
        let url = Url::parse("https://example.com/").unwrap();
        let get = ProxyRequest::get(url.clone(), Destination::Document);
        assert!(get.is_cacheable());
        assert_eq!(get.cache_key(), "https://example.com/");

        let post = ProxyRequest::get(url, Destination::Other).with_method("post");
        assert_eq!(post.method, "POST");
        assert!(!post.is_cacheable());
    }

    #[test]
    fn test_cache_key_drops_fragment() {
        let url = Url::parse("https://example.com/assets/index.css?v=2#top").unwrap();
        let req = ProxyRequest::get(url, Destination::Style);
        assert_eq!(req.cache_key(), "https://example.com/assets/index.css?v=2");

        let plain = ProxyRequest::get(Url::parse("https://example.com/").unwrap(), Destination::Document);
        assert_eq!(plain.cache_key(), "https://example.com/");
    }

    #[test]
    fn test_response_ok_range() {
        assert!(ProxyResponse::new("u", 200, "").is_ok());
        assert!(ProxyResponse::new("u", 204, "").is_ok());
        assert!(!ProxyResponse::new("u", 304, "").is_ok());
        assert!(!ProxyResponse::new("u", 404, "").is_ok());
        assert!(!ProxyResponse::network_error().is_ok());
        assert!(ProxyResponse::network_error().is_network_error());
    }

    #[test]
    fn test_response_headers() {
        let response = ProxyResponse::new("u", 200, "body").with_header("Content-Type", "text/css");
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("text/css"));
        assert_eq!(response.body_text(), "body");
    }
}
