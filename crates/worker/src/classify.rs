//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. method other than GET → [`Classification::Ineligible`]
//! 2. navigation mode, or `Accept` containing `text/html` → [`Classification::NavigationHtml`]
//! 3. path ending with a data-manifest suffix → [`Classification::VersionedData`]
//! 4. URL under a configured CDN origin → [`Classification::CdnAsset`]
//! 5. anything else → [`Classification::Generic`]
//!
//! An HTML navigation to a path that also ends with a data suffix is a
//! navigation.

use std::fmt;

use swcache_core::{Error, Request, WorkerConfig};
use url::{Origin, Url};

use crate::strategy::Strategy;

/// Per-request routing tag. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ineligible,
    NavigationHtml,
    VersionedData,
    CdnAsset,
    Generic,
}

impl Classification {
    /// Strategy serving this class, or `None` when the request must not be
    /// intercepted.
    pub fn strategy(self) -> Option<Strategy> {
        match self {
            Classification::Ineligible => None,
            Classification::NavigationHtml | Classification::VersionedData => Some(Strategy::NetworkFirst),
            Classification::CdnAsset => Some(Strategy::StaleWhileRevalidate),
            Classification::Generic => Some(Strategy::CacheFirst),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Ineligible => "ineligible",
            Classification::NavigationHtml => "navigation-html",
            Classification::VersionedData => "versioned-data",
            Classification::CdnAsset => "cdn-asset",
            Classification::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// A third-party origin, optionally narrowed to a path prefix.
#[derive(Debug, Clone)]
struct CdnOrigin {
    origin: Origin,
    path_prefix: String,
}

impl CdnOrigin {
    fn parse(input: &str) -> Result<Self, Error> {
        let url = Url::parse(input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("{input}: unsupported scheme {}", url.scheme())));
        }
        Ok(Self { origin: url.origin(), path_prefix: url.path().to_string() })
    }

    fn matches(&self, url: &Url) -> bool {
        url.origin() == self.origin && url.path().starts_with(&self.path_prefix)
    }
}

/// Static routing configuration: data suffixes and CDN origins.
#[derive(Debug, Clone, Default)]
pub struct RoutingRules {
    data_suffixes: Vec<String>,
    cdn_origins: Vec<CdnOrigin>,
}

impl RoutingRules {
    /// Build rules from data suffixes and CDN origin URLs.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if a CDN origin is not an http(s) URL.
    pub fn new<S: AsRef<str>>(data_suffixes: &[S], cdn_origins: &[S]) -> Result<Self, Error> {
        let cdn_origins = cdn_origins
            .iter()
            .map(|o| CdnOrigin::parse(o.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { data_suffixes: data_suffixes.iter().map(|s| s.as_ref().to_string()).collect(), cdn_origins })
    }

    pub fn from_config(config: &WorkerConfig) -> Result<Self, Error> {
        Self::new(config.data_manifest_suffixes.as_slice(), config.cdn_origins.as_slice())
    }

    /// Classify a request. Total: never fails, never does I/O.
    pub fn classify(&self, request: &Request) -> Classification {
        if !request.is_get() {
            return Classification::Ineligible;
        }

        if request.is_navigation() || request.accept().contains("text/html") {
            return Classification::NavigationHtml;
        }

        let path = request.url.path();
        if self.data_suffixes.iter().any(|suffix| path.ends_with(suffix.as_str())) {
            return Classification::VersionedData;
        }

        if self.cdn_origins.iter().any(|cdn| cdn.matches(&request.url)) {
            return Classification::CdnAsset;
        }

        Classification::Generic
    }
}
