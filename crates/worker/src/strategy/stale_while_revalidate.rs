//! Stale-while-revalidate, for third-party static assets.

use swcache_core::{Request, Response};
use tokio::sync::oneshot;

use super::{StrategyEngine, runtime_write};

impl StrategyEngine {
    /// The runtime copy right away, while a background fetch refreshes it.
    ///
    /// Without a cached copy the caller waits for that fetch; if it fails
    /// too, a 504 placeholder is returned.
    pub async fn stale_while_revalidate(&self, request: &Request) -> Response {
        let cached = self.lookup(&self.runtime_store, request).await;

        let (tx, rx) = oneshot::channel();
        let network = self.network.clone();
        let storage = self.storage.clone();
        let store = self.runtime_store.clone();
        let req = request.clone();
        self.background.spawn(async move {
            match network.fetch(&req).await {
                Ok(fresh) => {
                    let write = runtime_write(storage, &store, &req, &fresh);
                    let _ = tx.send(Some(fresh));
                    if let Some(write) = write {
                        write.await;
                    }
                }
                Err(err) => {
                    tracing::debug!(url = %req.url, error = %err, "revalidation fetch failed");
                    let _ = tx.send(None);
                }
            }
        });

        if let Some(hit) = cached {
            tracing::debug!(url = %request.url, "serving cached asset while revalidating");
            return hit;
        }

        match rx.await {
            Ok(Some(fresh)) => fresh,
            _ => Response::gateway_timeout(),
        }
    }
}
