//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWCACHE_*)
//! 2. TOML config file (if SWCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! List values can be given in the environment using figment's array syntax,
//! e.g. `SWCACHE_CDN_ORIGINS='["https://fonts.gstatic.com/"]'`.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Worker configuration.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWCACHE_*)
/// 2. TOML config file (if SWCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Deployment version tag. Changing it invalidates every older store.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin the application is served from; manifest paths resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to the SQLite database backing the stores.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Paths fetched into the precache store on install, in order.
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// Document served for offline navigations with no cached copy.
    #[serde(default = "default_fallback_document")]
    pub fallback_document: String,

    /// Path suffixes of data files routed network-first.
    #[serde(default = "default_data_manifest_suffixes")]
    pub data_manifest_suffixes: Vec<String>,

    /// Third-party static asset origins routed stale-while-revalidate.
    ///
    /// An entry may carry a path, in which case only URLs below it match.
    #[serde(default = "default_cdn_origins")]
    pub cdn_origins: Vec<String>,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts per manifest asset during install.
    #[serde(default)]
    pub precache_retries: u32,
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swcache.sqlite")
}

fn default_precache_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/schedule.json",
        "/favicon_io/favicon-16x16.png",
        "/favicon_io/favicon-32x32.png",
        "/favicon_io/apple-touch-icon.png",
        "/favicon_io/android-chrome-192x192.png",
        "/favicon_io/android-chrome-512x512.png",
        "/site.webmanifest",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fallback_document() -> String {
    "/index.html".into()
}

fn default_data_manifest_suffixes() -> Vec<String> {
    vec!["/schedule.json".into()]
}

fn default_cdn_origins() -> Vec<String> {
    vec![
        "https://cdn.tailwindcss.com".into(),
        "https://fonts.googleapis.com/".into(),
        "https://fonts.gstatic.com/".into(),
    ]
}

fn default_user_agent() -> String {
    "swcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            origin: default_origin(),
            db_path: default_db_path(),
            precache_manifest: default_precache_manifest(),
            fallback_document: default_fallback_document(),
            data_manifest_suffixes: default_data_manifest_suffixes(),
            cdn_origins: default_cdn_origins(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            precache_retries: 0,
        }
    }
}

impl WorkerConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed application origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWCACHE_`
    /// 2. TOML file from `SWCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
