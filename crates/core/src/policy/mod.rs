//! Request interception policy.
//!
//! Classification runs in this order:
//!
//! 1. Cross-origin requests pass through.
//! 2. Paths under an excluded prefix pass through.
//! 3. Paths under the API cache prefix (if configured) go network-first into the API store.
//! 4. Documents go network-first; styles, images and fonts go cache-first.
//! 5. Everything else goes network-first.
//!
//! Whether the worker is activated is decided by the worker, not here.

pub mod manifest;

pub use manifest::PrecacheManifest;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::StoreKind;
use crate::config::{ApiCacheConfig, AppConfig};
use crate::http::{Destination, ProxyRequest};
use crate::Error;

/// Caching strategy chosen for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

/// Why a request was not intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassReason {
    NotActivated,
    CrossOrigin,
    ExcludedPath,
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Passthrough(PassReason),
    Intercept { strategy: Strategy, store: StoreKind },
}

/// Resolved, immutable settings the worker runs with.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub app_name: String,
    pub version: String,
    pub build_time: Option<String>,
    pub origin: Url,
    pub manifest: PrecacheManifest,
    pub excluded_prefixes: Vec<String>,
    pub api_cache: Option<ApiCacheConfig>,
    pub skip_waiting: bool,
}

impl ProxySettings {
    /// Build settings from a validated config.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let manifest = PrecacheManifest::resolve(&origin, &config.base_path, &config.precache)?;

        Ok(Self {
            app_name: config.app_name.clone(),
            version: config.version.clone(),
            build_time: config.build_time.clone(),
            origin,
            manifest,
            excluded_prefixes: config.excluded_prefixes.clone(),
            api_cache: config.api_cache.clone(),
            skip_waiting: config.skip_waiting,
        })
    }

    /// Name of the current app-shell store: `{app_name}-{version}`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.app_name, self.version)
    }

    /// Name of the current API store, if one is configured.
    pub fn api_cache_name(&self) -> Option<String> {
        self.api_cache
            .as_ref()
            .map(|api| format!("{}-api-{}", self.app_name, api.version))
    }

    /// Store name and version for a store kind.
    pub fn store_for(&self, kind: StoreKind) -> Option<(String, &str)> {
        match kind {
            StoreKind::AppShell => Some((self.cache_name(), self.version.as_str())),
            StoreKind::Api => self
                .api_cache
                .as_ref()
                .map(|api| (format!("{}-api-{}", self.app_name, api.version), api.version.as_str())),
        }
    }

    /// Store names that survive activation.
    pub fn current_store_names(&self) -> Vec<String> {
        let mut names = vec![self.cache_name()];
        names.extend(self.api_cache_name());
        names
    }

    /// Version as reported to clients; `"none"` when unset.
    pub fn version_label(&self) -> &str {
        if self.version.is_empty() { "none" } else { &self.version }
    }

    /// Classify a request.
    pub fn classify(&self, request: &ProxyRequest) -> Route {
        if request.url.origin() != self.origin.origin() {
            return Route::Passthrough(PassReason::CrossOrigin);
        }

        let path = request.url.path();
        if self.excluded_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return Route::Passthrough(PassReason::ExcludedPath);
        }

        if let Some(api) = &self.api_cache
            && path.starts_with(api.prefix.as_str())
        {
            return Route::Intercept { strategy: Strategy::NetworkFirst, store: StoreKind::Api };
        }

        let strategy = match request.destination {
            Destination::Document => Strategy::NetworkFirst,
            Destination::Style | Destination::Image | Destination::Font => Strategy::CacheFirst,
            Destination::Script | Destination::Other => Strategy::NetworkFirst,
        };

        Route::Intercept { strategy, store: StoreKind::AppShell }
    }
}
