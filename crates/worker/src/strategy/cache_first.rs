//! Cache-first with fill, the default for same-version static assets.

use swcache_core::{Request, Response};

use super::StrategyEngine;

impl StrategyEngine {
    /// A cached copy without touching the network; otherwise fetch, store
    /// and return. A network failure on a miss is a 504 placeholder.
    pub async fn cache_first(&self, request: &Request) -> Response {
        if let Some(hit) = self.lookup_current(request).await {
            tracing::debug!(url = %request.url, "cache hit");
            return hit;
        }

        match self.network.fetch(request).await {
            Ok(fresh) => {
                self.write_behind(request, &fresh);
                fresh
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "network failed with nothing cached");
                Response::gateway_timeout()
            }
        }
    }
}
