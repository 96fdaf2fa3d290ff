//! Resolution of application paths against the application origin.

use url::Url;

/// Error type for asset URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a manifest or fallback path against the application origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative paths onto `origin`; absolute URLs are kept
/// 3. Reject schemes other than http/https
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve_asset(origin: &Url, path: &str) -> Result<Url, UrlError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    resolved.set_fragment(None);

    Ok(resolved)
}
