//! Network-first with cache fallback, for navigations and data files.

use swcache_core::{Request, Response};

use super::StrategyEngine;

impl StrategyEngine {
    /// Fresh from the network when possible.
    ///
    /// On network failure: the cached copy, then (for navigations) the
    /// fallback document from any store, then a 503 placeholder.
    pub async fn network_first(&self, request: &Request) -> Response {
        let err = match self.network.fetch(request).await {
            Ok(fresh) => {
                self.write_behind(request, &fresh);
                return fresh;
            }
            Err(err) => err,
        };

        if let Some(cached) = self.lookup_current(request).await {
            tracing::debug!(url = %request.url, error = %err, "network failed; serving cached copy");
            return cached;
        }

        if request.is_navigation()
            && let Some(shell) = self.lookup_any(&self.fallback).await
        {
            tracing::debug!(url = %request.url, fallback = %self.fallback.url, "network failed; serving fallback document");
            return shell;
        }

        tracing::warn!(url = %request.url, error = %err, "network failed with nothing cached; serving offline placeholder");
        Response::offline()
    }
}
