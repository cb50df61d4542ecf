//! Precache manifest resolution.

use url::Url;

use crate::Error;

/// Ordered URLs fetched and stored at install time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrecacheManifest {
    urls: Vec<Url>,
}

impl PrecacheManifest {
    /// Resolve manifest entries against an origin and base path.
    ///
    /// - `""` resolves to `base_path` itself
    /// - entries starting with `/` are origin-absolute
    /// - anything else is appended to `base_path`
    ///
    /// Duplicates are dropped; the first occurrence keeps its position.
    pub fn resolve(origin: &Url, base_path: &str, entries: &[String]) -> Result<Self, Error> {
        let mut urls: Vec<Url> = Vec::with_capacity(entries.len());

        for entry in entries {
            let path = if entry.starts_with('/') { entry.clone() } else { format!("{base_path}{entry}") };

            let mut url = origin
                .join(&path)
                .map_err(|e| Error::InvalidUrl(format!("precache entry '{entry}': {e}")))?;
            url.set_fragment(None);

            if !urls.contains(&url) {
                urls.push(url);
            }
        }

        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_under_base_path() {
        let manifest = PrecacheManifest::resolve(
            &origin(),
            "/sadcore/",
            &entries(&["", "index.html", "assets/index.css", "manifest.json"]),
        )
        .unwrap();

        let urls: Vec<&str> = manifest.urls().iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/sadcore/",
                "https://example.com/sadcore/index.html",
                "https://example.com/sadcore/assets/index.css",
                "https://example.com/sadcore/manifest.json",
            ]
        );
    }

    #[test]
    fn test_resolve_absolute_entries() {
        let manifest = PrecacheManifest::resolve(&origin(), "/app/", &entries(&["/", "/index.html"])).unwrap();
        let urls: Vec<&str> = manifest.urls().iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://example.com/", "https://example.com/index.html"]);
    }

    #[test]
    fn test_resolve_dedupes_in_order() {
        let manifest =
            PrecacheManifest::resolve(&origin(), "/", &entries(&["index.html", "", "/index.html", "/#top"])).unwrap();
        let urls: Vec<&str> = manifest.urls().iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://example.com/index.html", "https://example.com/"]);
    }

    #[test]
    fn test_resolve_empty() {
        let manifest = PrecacheManifest::resolve(&origin(), "/", &[]).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.len(), 0);
    }
}
