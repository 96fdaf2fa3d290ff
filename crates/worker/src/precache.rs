//! Install-time precaching of the asset manifest.
//!
//! The batch is all-or-nothing: every asset is fetched first, and the store
//! is written in one transaction only when all of them succeeded. A non-2xx
//! response counts as a failed fetch.

use std::time::Duration;

use futures_util::future::try_join_all;
use swcache_client::{Network, resolve_asset};
use swcache_core::{Error, Request, Response, Store};
use url::Url;

/// Delay before the first retry; doubles on each further attempt.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Ceiling for a single retry delay.
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Fetches the manifest into the precache store.
#[derive(Debug, Clone)]
pub struct PrecacheLoader {
    manifest: Vec<Url>,
    retries: u32,
}

impl PrecacheLoader {
    /// Resolve manifest paths against the application origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if a path cannot be resolved.
    pub fn new<S: AsRef<str>>(origin: &Url, manifest: &[S], retries: u32) -> Result<Self, Error> {
        let manifest = manifest
            .iter()
            .map(|path| {
                resolve_asset(origin, path.as_ref()).map_err(|e| Error::InvalidUrl(format!("{}: {e}", path.as_ref())))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { manifest, retries })
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    /// Fetch every manifest entry and commit them to `store` as one batch.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns `Error::PrecacheFailed` for the first asset that could not be
    /// fetched; nothing is written in that case.
    pub async fn install(&self, network: &dyn Network, store: &Store) -> Result<usize, Error> {
        let entries = try_join_all(self.manifest.iter().map(|url| self.fetch_asset(network, url))).await?;
        store.put_all(&entries).await?;
        tracing::info!(store = store.name(), assets = entries.len(), "precache complete");
        Ok(entries.len())
    }

    async fn fetch_asset(&self, network: &dyn Network, url: &Url) -> Result<(Request, Response), Error> {
        let request = Request::get(url.clone());
        let mut attempt = 0;
        loop {
            let reason = match network.fetch(&request).await {
                Ok(response) if response.is_ok() => return Ok((request, response)),
                Ok(response) => format!("status {}", response.status),
                Err(err) => err.to_string(),
            };

            if attempt >= self.retries {
                tracing::warn!(url = %url, %reason, "precache fetch failed");
                return Err(Error::PrecacheFailed { url: url.to_string(), reason });
            }

            attempt += 1;
            tracing::debug!(url = %url, %reason, attempt, "retrying precache fetch");
            tokio::time::sleep(retry_delay(attempt)).await;
        }
    }
}

/// Delay before retry number `attempt` (1-based): doubling, capped.
fn retry_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    RETRY_BASE_DELAY.saturating_mul(factor).min(RETRY_MAX_DELAY)
}
