//! Version-tagged store names and the activation sweep.

use futures_util::future::join_all;
use swcache_core::{CacheStorage, WorkerConfig};

/// Owns the two store names derived from the version tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManager {
    tag: String,
    precache: String,
    runtime: String,
}

/// Outcome of an activation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Stale stores that were dropped.
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed and were skipped.
    pub failed: Vec<String>,
}

impl VersionManager {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self { precache: format!("precache-{tag}"), runtime: format!("runtime-{tag}"), tag }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.version.clone())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn precache_name(&self) -> &str {
        &self.precache
    }

    pub fn runtime_name(&self) -> &str {
        &self.runtime
    }

    /// Whether `name` is one of the two live stores.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.precache || name == self.runtime
    }

    /// Drop every store that is not current, then make sure both current
    /// stores exist.
    ///
    /// Best-effort throughout: a failed listing or deletion is logged and
    /// skipped, never returned.
    pub async fn activate(&self, storage: &dyn CacheStorage) -> SweepReport {
        let mut report = SweepReport::default();

        let names = match storage.store_names().await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!(error = %err, "could not list stores; skipping stale store sweep");
                Vec::new()
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|name| !self.is_current(name)).collect();
        let results = join_all(stale.iter().map(|name| storage.delete_store(name))).await;

        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::info!(store = %name, "deleted stale store");
                    report.deleted.push(name);
                }
                Err(err) => {
                    tracing::warn!(store = %name, error = %err, "failed to delete stale store");
                    report.failed.push(name);
                }
            }
        }

        for name in [&self.precache, &self.runtime] {
            if let Err(err) = storage.open(name).await {
                tracing::warn!(store = %name, error = %err, "failed to open current store");
            }
        }

        report
    }
}
