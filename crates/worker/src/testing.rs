//! Test doubles for the network, the host and the store provider.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use swcache_client::{Network, NetworkError};
use swcache_core::{CacheDb, CacheStorage, Error, Request, Response};
use url::Url;

use crate::host::Host;

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Network answering from a URL table. Unknown URLs get a 404.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashMap<String, Option<usize>>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Every fetch of `url` fails.
    pub(crate) fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string(), None);
    }

    /// The next `times` fetches of `url` fail.
    pub(crate) fn fail_times(&self, url: &str, times: usize) {
        self.failing.lock().unwrap().insert(url.to_string(), Some(times));
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn should_fail(&self, url: &str) -> bool {
        if self.offline.load(Ordering::SeqCst) {
            return true;
        }
        let mut failing = self.failing.lock().unwrap();
        match failing.get_mut(url) {
            None => false,
            Some(None) => true,
            Some(Some(0)) => false,
            Some(Some(left)) => {
                *left -= 1;
                true
            }
        }
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let key = request.url.to_string();
        self.calls.lock().unwrap().push(key.clone());
        tokio::task::yield_now().await;

        if self.should_fail(&key) {
            return Err(NetworkError::Timeout);
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(404)))
    }
}

/// Host counting the signals it receives.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) skip_waiting: AtomicUsize,
    pub(crate) claims: AtomicUsize,
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory SQLite storage that counts calls and can refuse deletions.
pub(crate) struct FlakyStorage {
    db: CacheDb,
    calls: AtomicUsize,
    fail_delete: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub(crate) async fn new() -> Self {
        Self { db: CacheDb::open_in_memory().await.unwrap(), calls: AtomicUsize::new(0), fail_delete: Mutex::default() }
    }

    pub(crate) fn fail_delete(&self, name: &str) {
        self.fail_delete.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.record();
        self.db.open(name).await
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.record();
        self.db.lookup(name, request).await
    }

    async fn lookup_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.record();
        self.db.lookup_any(request).await
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.record();
        self.db.put(name, request, response).await
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.record();
        self.db.put_all(name, entries).await
    }

    async fn delete(&self, name: &str, request: &Request) -> Result<bool, Error> {
        self.record();
        self.db.delete(name, request).await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.record();
        if self.fail_delete.lock().unwrap().contains(name) {
            return Err(Error::InvalidState(format!("store {name} is locked")));
        }
        self.db.delete_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.record();
        self.db.store_names().await
    }

    async fn keys(&self, name: &str) -> Result<Vec<Url>, Error> {
        self.record();
        self.db.keys(name).await
    }
}
