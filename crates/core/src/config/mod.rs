//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from, highest precedence first:
//!
//! 1. Environment variables (WARDEN_*)
//! 2. TOML config file (if WARDEN_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The defaults describe the Shadow Defense site: its cache version tag,
//! the install manifest and the `/game/` bundled-asset prefix.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache storage database.
    ///
    /// Set via WARDEN_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker serves, e.g. `https://shadowdefense.example`.
    ///
    /// Only same-origin requests are intercepted. Set via WARDEN_ORIGIN.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Name of the current cache store. Doubles as the version tag:
    /// every other store is purged on activation.
    ///
    /// Set via WARDEN_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Asset paths fetched into the current store on install.
    ///
    /// Set via WARDEN_MANIFEST (e.g. `[/play.html,/game/index.wasm]`).
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Path prefix served cache-first. Everything else is network-first.
    ///
    /// Set via WARDEN_BUNDLED_PREFIX environment variable.
    #[serde(default = "default_bundled_prefix")]
    pub bundled_prefix: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via WARDEN_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via WARDEN_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via WARDEN_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long the game loader waits before showing its "still loading" message.
    ///
    /// Set via WARDEN_LOAD_FALLBACK_MS environment variable.
    #[serde(default = "default_load_fallback_ms")]
    pub load_fallback_ms: u64,

    /// Path of the embedded game document.
    ///
    /// Set via WARDEN_GAME_PATH environment variable.
    #[serde(default = "default_game_path")]
    pub game_path: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./warden-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_name() -> String {
    "shadow-defense-v2".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/play.html",
        "/game/index.wasm",
        "/game/index.pck",
        "/game/index.js",
        "/game/index.html",
        "/css/style.css",
        "/js/main.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_bundled_prefix() -> String {
    "/game/".into()
}

fn default_user_agent() -> String {
    "warden/0.1".into()
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024 // game .pck files are large
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_load_fallback_ms() -> u64 {
    5_000
}

fn default_game_path() -> String {
    "/game/index.html".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_name: default_cache_name(),
            manifest: default_manifest(),
            bundled_prefix: default_bundled_prefix(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            load_fallback_ms: default_load_fallback_ms(),
            game_path: default_game_path(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Game loader stall threshold.
    pub fn load_fallback(&self) -> Duration {
        Duration::from_millis(self.load_fallback_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WARDEN_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(
            figment.merge(
                Env::prefixed("WARDEN_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            ),
        )
    }

    /// Extract and validate from an already-layered figment.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./warden-cache.sqlite"));
        assert_eq!(config.cache_name, "shadow-defense-v2");
        assert_eq!(config.bundled_prefix, "/game/");
        assert_eq!(config.manifest.len(), 7);
        assert_eq!(config.manifest[0], "/play.html");
        assert_eq!(config.user_agent, "warden/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.load_fallback_ms, 5_000);
        assert_eq!(config.game_path, "/game/index.html");
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.load_fallback(), Duration::from_secs(5));
    }

    #[test]
    fn test_extract_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_name = "shadow-defense-v3"
            manifest = ["/index.html", "/game/x.wasm"]
            load_fallback_ms = 1500
            "#,
        ));

        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.cache_name, "shadow-defense-v3");
        assert_eq!(config.manifest, vec!["/index.html", "/game/x.wasm"]);
        assert_eq!(config.load_fallback(), Duration::from_millis(1500));
        assert_eq!(config.bundled_prefix, "/game/");
    }

    #[test]
    fn test_extract_rejects_invalid() {
        let figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(r#"cache_name = """#));
        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_name"));
    }
}
