//! Configuration validation rules.
//!
//! Runs after `AppConfig` has been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `cache_name` or `user_agent` is empty
    /// - `bundled_prefix`, `game_path` or a manifest entry does not start with `/`
    /// - `max_bytes` is 0
    /// - `timeout_ms` is outside 100ms..=5 minutes
    /// - `load_fallback_ms` is 0 or over 1 minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.origin.is_empty() {
            return Err(ConfigError::Missing {
                field: "origin".into(),
                hint: "Set WARDEN_ORIGIN to the site's origin, e.g. https://example.com".into(),
            });
        }
        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(invalid("origin", "must be an http:// or https:// URL"));
        }

        if self.cache_name.trim().is_empty() {
            return Err(invalid("cache_name", "must not be empty"));
        }

        if !self.bundled_prefix.starts_with('/') {
            return Err(invalid("bundled_prefix", "must start with '/'"));
        }
        if !self.game_path.starts_with('/') {
            return Err(invalid("game_path", "must start with '/'"));
        }
        if let Some(bad) = self.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("manifest", format!("entry {bad:?} must start with '/'")));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.load_fallback_ms == 0 {
            return Err(invalid("load_fallback_ms", "must be greater than 0"));
        }
        if self.load_fallback_ms > 60_000 {
            return Err(invalid("load_fallback_ms", "must not exceed 1 minute (60000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; install will only create the cache store");
        }

        Ok(())
    }
}
