//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn require_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("{value}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(field, format!("{value}: unsupported scheme {scheme}"))),
    }
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains whitespace
    /// - `origin` or any `cdn_origins` entry is not an http(s) URL
    /// - a manifest entry or `fallback_document` is not an absolute path
    /// - `data_manifest_suffixes` contains an empty suffix
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `precache_retries` exceeds 5
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(invalid("version", "must not be empty"));
        }
        if self.version.chars().any(char::is_whitespace) {
            return Err(invalid("version", "must not contain whitespace"));
        }

        require_http_url("origin", &self.origin)?;

        if let Some(path) = self.precache_manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("precache_manifest", format!("{path:?} must start with '/'")));
        }

        if !self.fallback_document.starts_with('/') {
            return Err(invalid("fallback_document", "must start with '/'"));
        }

        if self.data_manifest_suffixes.iter().any(String::is_empty) {
            return Err(invalid("data_manifest_suffixes", "suffixes must not be empty"));
        }

        for origin in &self.cdn_origins {
            require_http_url("cdn_origins", origin)?;
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.precache_retries > 5 {
            return Err(invalid("precache_retries", "must not exceed 5"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if !self.precache_manifest.contains(&self.fallback_document) {
            tracing::warn!(
                fallback = %self.fallback_document,
                "fallback_document is not precached; offline navigation fallback relies on runtime caching"
            );
        }

        Ok(())
    }
}
