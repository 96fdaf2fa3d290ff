//! The long-lived worker object and its lifecycle hooks.
//!
//! One `ServiceWorker` is built at process start and receives three kinds of
//! events from its host:
//!
//! - `on_install`: precache the manifest, then ask to skip waiting
//! - `on_activate`: sweep stale stores, then claim open clients
//! - `on_fetch`: classify the request and answer it with one strategy
//!
//! Each hook finishes all of its asynchronous work before returning, so the
//! host can rely on install completing before activate, and activate before
//! any request is routed.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use swcache_client::{FetchClient, FetchConfig, Network, resolve_asset};
use swcache_core::{CacheDb, CacheStorage, Error, Request, Response, Store, WorkerConfig};

use crate::classify::{Classification, RoutingRules};
use crate::host::{DetachedHost, Host};
use crate::precache::PrecacheLoader;
use crate::strategy::{Strategy, StrategyEngine};
use crate::versions::{SweepReport, VersionManager};

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this worker will never control clients.
    Redundant,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Parsed => "parsed",
            Lifecycle::Installing => "installing",
            Lifecycle::Installed => "installed",
            Lifecycle::Activating => "activating",
            Lifecycle::Activated => "activated",
            Lifecycle::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// What the host should do with an observed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted: send the untouched request to the network.
    Passthrough(Request),
    /// Use this response instead of the network's.
    Respond(Response),
}

/// Caching proxy for one application version.
pub struct ServiceWorker {
    versions: VersionManager,
    rules: RoutingRules,
    precache: PrecacheLoader,
    engine: StrategyEngine,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    state: Mutex<Lifecycle>,
}

impl ServiceWorker {
    /// Build a worker over explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` or `Error::InvalidUrl` if the
    /// configuration does not validate.
    pub fn new(
        config: &WorkerConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, host: Arc<dyn Host>,
    ) -> Result<Self, Error> {
        config.validate().map_err(|e| Error::InvalidInput(e.to_string()))?;
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let versions = VersionManager::from_config(config);
        let rules = RoutingRules::from_config(config)?;
        let precache =
            PrecacheLoader::new(&origin, config.precache_manifest.as_slice(), config.precache_retries)?;
        let fallback_url = resolve_asset(&origin, &config.fallback_document)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.fallback_document)))?;
        let engine = StrategyEngine::new(
            storage.clone(),
            network.clone(),
            versions.runtime_name(),
            versions.precache_name(),
            Request::get(fallback_url),
        );

        Ok(Self { versions, rules, precache, engine, storage, network, host, state: Mutex::new(Lifecycle::Parsed) })
    }

    /// Build a worker with the SQLite store at `config.db_path`, the HTTP
    /// network client and a detached host.
    pub async fn from_config(config: &WorkerConfig) -> Result<Self, Error> {
        let storage = Arc::new(CacheDb::open(&config.db_path).await?);
        let network = Arc::new(
            FetchClient::new(FetchConfig::from(config)).map_err(|e| Error::InvalidInput(e.to_string()))?,
        );
        Self::new(config, storage, network, Arc::new(DetachedHost))
    }

    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `to` if the current state is one of `from`.
    fn transition(&self, from: &[Lifecycle], to: Lifecycle) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !from.contains(&state) {
            return Err(Error::InvalidState(format!("cannot enter {to} from {}", *state)));
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: Lifecycle) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    /// Install hook: precache the manifest as one batch.
    ///
    /// Returns the number of precached assets.
    ///
    /// # Errors
    ///
    /// Any asset failure fails the install and leaves the worker redundant.
    pub async fn on_install(&self) -> Result<usize, Error> {
        self.transition(&[Lifecycle::Parsed], Lifecycle::Installing)?;

        let result = async {
            let store = Store::open(self.storage.clone(), self.versions.precache_name()).await?;
            self.precache.install(self.network.as_ref(), &store).await
        }
        .await;

        match result {
            Ok(count) => {
                self.host.skip_waiting().await;
                self.set_state(Lifecycle::Installed);
                tracing::info!(version = self.versions.tag(), assets = count, "installed");
                Ok(count)
            }
            Err(err) => {
                self.set_state(Lifecycle::Redundant);
                tracing::warn!(version = self.versions.tag(), error = %err, "install failed");
                Err(err)
            }
        }
    }

    /// Activate hook: drop stale stores, then take control of open clients.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless install completed. Store
    /// deletion failures are logged and never returned.
    pub async fn on_activate(&self) -> Result<SweepReport, Error> {
        self.transition(&[Lifecycle::Installed, Lifecycle::Activated], Lifecycle::Activating)?;

        let report = self.versions.activate(self.storage.as_ref()).await;
        self.host.claim_clients().await;
        self.set_state(Lifecycle::Activated);

        tracing::info!(
            version = self.versions.tag(),
            deleted = ?report.deleted,
            failed = ?report.failed,
            "activated"
        );
        Ok(report)
    }

    /// Pure routing decision; `None` means the request is not intercepted.
    pub fn route(&self, request: &Request) -> Option<Strategy> {
        self.classify(request).strategy()
    }

    pub fn classify(&self, request: &Request) -> Classification {
        self.rules.classify(request)
    }

    /// Fetch hook: answer an observed request.
    ///
    /// Before activation nothing is intercepted. Never fails: network
    /// failures are already turned into responses by the strategy.
    pub async fn on_fetch(&self, request: Request) -> FetchOutcome {
        let state = self.lifecycle();
        if state != Lifecycle::Activated {
            tracing::debug!(url = %request.url, %state, "not controlling clients yet; passing through");
            return FetchOutcome::Passthrough(request);
        }

        let classification = self.classify(&request);
        let Some(strategy) = classification.strategy() else {
            tracing::debug!(method = %request.method, url = %request.url, "not intercepted");
            return FetchOutcome::Passthrough(request);
        };

        tracing::debug!(url = %request.url, %classification, %strategy, "intercepted");
        FetchOutcome::Respond(self.engine.run(strategy, &request).await)
    }

    /// Wait for background store writes started by earlier requests.
    pub async fn settle(&self) {
        self.engine.background().settle().await;
    }
}
