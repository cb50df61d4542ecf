//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// A separately versioned store for API responses.
///
/// Requests under `prefix` are cached network-first into
/// `{app_name}-api-{version}`, and that store survives app-shell activations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCacheConfig {
    pub prefix: String,
    pub version: String,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Application name, used as the store name prefix.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Deployed version; embedded in the current store name.
    ///
    /// Set via SHELLCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Build timestamp injected by the build, reported alongside the version.
    #[serde(default)]
    pub build_time: Option<String>,

    /// Origin the application is served from. Requests to other origins pass through.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Base path the application is mounted under (e.g. `/app/`).
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Precache entries, relative to `base_path` unless they start with `/`.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Path prefixes that are never intercepted.
    ///
    /// Set via SHELLCACHE_EXCLUDED_PREFIXES environment variable.
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Optional separately versioned API store.
    #[serde(default)]
    pub api_cache: Option<ApiCacheConfig>,

    /// Activate right after install instead of waiting for an explicit activate.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_app_name() -> String {
    "shellcache".into()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_base_path() -> String {
    "/".into()
}

fn default_precache() -> Vec<String> {
    vec![String::new(), "index.html".into()]
}

fn default_excluded_prefixes() -> Vec<String> {
    vec!["/api/".into()]
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            app_name: default_app_name(),
            version: default_version(),
            build_time: None,
            origin: default_origin(),
            base_path: default_base_path(),
            precache: default_precache(),
            excluded_prefixes: default_excluded_prefixes(),
            api_cache: None,
            skip_waiting: true,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed,
    /// or if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var("SHELLCACHE_CONFIG_FILE").ok().map(PathBuf::from);
        Self::load_from(config_file)
    }

    /// Same as [`AppConfig::load`], with an explicit config file path.
    pub fn load_from(config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_path) = config_file {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./shellcache.sqlite"));
        assert_eq!(config.app_name, "shellcache");
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.base_path, "/");
        assert_eq!(config.precache, vec!["".to_string(), "index.html".to_string()]);
        assert_eq!(config.excluded_prefixes, vec!["/api/".to_string()]);
        assert!(config.api_cache.is_none());
        assert!(config.skip_waiting);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_load_layers_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "shellcache.toml",
                r#"
                app_name = "sadcore"
                version = "0.1.1-alpha"
                base_path = "/sadcore/"
                precache = ["", "index.html", "assets/index.css"]

                [api_cache]
                prefix = "/api/v2/"
                version = "3"
                "#,
            )?;
            jail.set_env("SHELLCACHE_VERSION", "0.1.2");

            let config = AppConfig::load_from(Some("shellcache.toml".into())).map_err(|e| e.to_string())?;
            assert_eq!(config.app_name, "sadcore");
            assert_eq!(config.version, "0.1.2");
            assert_eq!(config.base_path, "/sadcore/");
            assert_eq!(config.precache.len(), 3);
            assert_eq!(
                config.api_cache,
                Some(ApiCacheConfig { prefix: "/api/v2/".into(), version: "3".into() })
            );
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_base_path() {
        Jail::expect_with(|jail| {
            jail.set_env("SHELLCACHE_BASE_PATH", "app");
            let result = AppConfig::load_from(None);
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_path"));
            Ok(())
        });
    }
}
