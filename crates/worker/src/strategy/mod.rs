//! Caching strategies.
//!
//! Three interchangeable algorithms, each answering one request against the
//! current stores and the network:
//!
//! - [`Strategy::NetworkFirst`]: fresh when online, last known copy when not
//! - [`Strategy::StaleWhileRevalidate`]: cached copy now, refresh in the background
//! - [`Strategy::CacheFirst`]: cached copy forever once present
//!
//! Strategies never fail. A network failure always ends in a cached copy or
//! a synthetic placeholder (503 for navigations and data, 504 for assets).
//! Store errors on the serving path are logged and treated as misses.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

use std::fmt;
use std::sync::Arc;

use swcache_client::Network;
use swcache_core::{CacheStorage, Request, Response};

use crate::background::BackgroundWrites;

/// Partial content is never written to a store.
const PARTIAL_CONTENT: u16 = 206;

/// The caching algorithm chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    StaleWhileRevalidate,
    CacheFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::CacheFirst => "cache-first",
        };
        f.write_str(name)
    }
}

/// Runs strategies against the current stores.
#[derive(Clone)]
pub struct StrategyEngine {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    runtime_store: String,
    precache_store: String,
    fallback: Request,
    background: BackgroundWrites,
}

impl StrategyEngine {
    /// `fallback` is the shell document served to offline navigations that
    /// have no cached copy of their own.
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, runtime_store: impl Into<String>,
        precache_store: impl Into<String>, fallback: Request,
    ) -> Self {
        Self {
            storage,
            network,
            runtime_store: runtime_store.into(),
            precache_store: precache_store.into(),
            fallback,
            background: BackgroundWrites::new(),
        }
    }

    pub fn background(&self) -> &BackgroundWrites {
        &self.background
    }

    /// Answer `request` with `strategy`. Exactly one strategy runs.
    pub async fn run(&self, strategy: Strategy, request: &Request) -> Response {
        match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    /// Look up one store; errors are misses.
    async fn lookup(&self, store: &str, request: &Request) -> Option<Response> {
        match self.storage.lookup(store, request).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(store, url = %request.url, error = %err, "store lookup failed");
                None
            }
        }
    }

    /// Look up the runtime store, then the precache store.
    async fn lookup_current(&self, request: &Request) -> Option<Response> {
        if let Some(hit) = self.lookup(&self.runtime_store, request).await {
            return Some(hit);
        }
        self.lookup(&self.precache_store, request).await
    }

    /// Look up every store.
    async fn lookup_any(&self, request: &Request) -> Option<Response> {
        match self.storage.lookup_any(request).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "store lookup failed");
                None
            }
        }
    }

    /// Write a copy into the runtime store without holding up the caller.
    fn write_behind(&self, request: &Request, response: &Response) {
        let Some(write) = runtime_write(self.storage.clone(), &self.runtime_store, request, response) else {
            return;
        };
        self.background.spawn(write);
    }
}

/// Future that stores `response` under `request` in `store`, logging a
/// failure instead of returning it. `None` when the response must not be
/// cached.
fn runtime_write(
    storage: Arc<dyn CacheStorage>, store: &str, request: &Request, response: &Response,
) -> Option<impl Future<Output = ()> + Send + 'static> {
    if response.status == PARTIAL_CONTENT {
        tracing::debug!(url = %request.url, "not caching partial response");
        return None;
    }
    let store = store.to_string();
    let request = request.clone();
    let response = response.clone();
    Some(async move {
        if let Err(err) = storage.put(&store, &request, &response).await {
            tracing::warn!(store = %store, url = %request.url, error = %err, "background cache write failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedNetwork, url};
    use swcache_core::CacheDb;

    pub(crate) const RUNTIME: &str = "runtime-v1";
    pub(crate) const PRECACHE: &str = "precache-v1";

    pub(crate) async fn engine(network: Arc<ScriptedNetwork>) -> (Arc<CacheDb>, StrategyEngine) {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fallback = Request::get(url("http://localhost:8080/index.html"));
        let engine = StrategyEngine::new(db.clone(), network, RUNTIME, PRECACHE, fallback);
        (db, engine)
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::NetworkFirst.to_string(), "network-first");
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
        assert_eq!(Strategy::CacheFirst.to_string(), "cache-first");
    }

    #[tokio::test]
    async fn test_partial_response_not_cached() {
        let network = Arc::new(ScriptedNetwork::new());
        network.respond("http://localhost:8080/video.mp4", Response::new(206).with_body("part"));
        let (db, engine) = engine(network).await;
        let req = Request::get(url("http://localhost:8080/video.mp4"));

        let resp = engine.run(Strategy::CacheFirst, &req).await;
        engine.background().settle().await;

        assert_eq!(resp.status, 206);
        assert!(db.lookup(RUNTIME, &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_current_falls_back_to_precache() {
        let network = Arc::new(ScriptedNetwork::new());
        let (db, engine) = engine(network).await;
        let req = Request::get(url("http://localhost:8080/favicon.png"));
        db.put(PRECACHE, &req, &Response::new(200).with_body("icon")).await.unwrap();

        let hit = engine.lookup_current(&req).await.unwrap();
        assert_eq!(&hit.body[..], b"icon");
    }

    #[tokio::test]
    async fn test_lookup_current_prefers_runtime() {
        let network = Arc::new(ScriptedNetwork::new());
        let (db, engine) = engine(network).await;
        let req = Request::get(url("http://localhost:8080/schedule.json"));
        db.put(PRECACHE, &req, &Response::new(200).with_body("old")).await.unwrap();
        db.put(RUNTIME, &req, &Response::new(200).with_body("new")).await.unwrap();

        let hit = engine.lookup_current(&req).await.unwrap();
        assert_eq!(&hit.body[..], b"new");
    }
}
