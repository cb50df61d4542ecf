//! Request URL resolution for consistent store keys.

use ::url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a user-supplied URL or path into the URL used as a store key.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Inputs without a scheme are resolved against `origin` (`/x`, `x`, `?q`)
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    } else {
        origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lower = host.to_lowercase();
        parsed
            .set_host(Some(&lower))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.com/sadcore/").unwrap()
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve(&origin(), "https://example.com/assets/index.css").unwrap();
        assert_eq!(url.as_str(), "https://example.com/assets/index.css");
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&origin(), "/index.html").unwrap();
        assert_eq!(url.as_str(), "https://example.com/index.html");
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "assets/index.js").unwrap();
        assert_eq!(url.as_str(), "https://example.com/sadcore/assets/index.js");
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://EXAMPLE.COM/").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/index.html#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/search?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }
}
