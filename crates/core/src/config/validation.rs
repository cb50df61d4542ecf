//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `app_name` is empty or contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `base_path` or any prefix does not start with `/`
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.is_empty() || self.app_name.chars().any(char::is_whitespace) {
            return Err(invalid("app_name", "must be non-empty and contain no whitespace"));
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(_) => return Err(invalid("origin", "scheme must be http or https")),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if !self.base_path.starts_with('/') || !self.base_path.ends_with('/') {
            return Err(invalid("base_path", "must start and end with '/'"));
        }

        if let Some(prefix) = self.excluded_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid {
                field: "excluded_prefixes".into(),
                reason: format!("'{prefix}' must start with '/'"),
            });
        }

        if let Some(api) = &self.api_cache {
            if !api.prefix.starts_with('/') {
                return Err(invalid("api_cache.prefix", "must start with '/'"));
            }
            if api.version.is_empty() {
                return Err(invalid("api_cache.version", "must not be empty"));
            }
            if self.excluded_prefixes.iter().any(|p| api.prefix.starts_with(p.as_str())) {
                tracing::warn!(
                    api_prefix = %api.prefix,
                    "api_cache.prefix is covered by an excluded prefix; API requests will pass through"
                );
            }
        }

        if self.version.is_empty() {
            tracing::warn!("version is empty; store names will end in '-'");
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiCacheConfig;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_app_name_whitespace() {
        let config = AppConfig { app_name: "my app".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "app_name"));
    }

    #[test]
    fn test_validate_origin_scheme() {
        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_origin_unparseable() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_base_path_slashes() {
        let config = AppConfig { base_path: "/sadcore".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_path"));
    }

    #[test]
    fn test_validate_excluded_prefix() {
        let config = AppConfig { excluded_prefixes: vec!["api/".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "excluded_prefixes"));
    }

    #[test]
    fn test_validate_api_cache_version() {
        let config = AppConfig {
            api_cache: Some(ApiCacheConfig { prefix: "/data/".into(), version: String::new() }),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "api_cache.version"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_empty_version_allowed() {
        let config = AppConfig { version: String::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
