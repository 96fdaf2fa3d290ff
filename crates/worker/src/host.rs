//! Signals the worker sends back to its host environment.

use async_trait::async_trait;

/// Host environment that delivers lifecycle events to the worker.
#[async_trait]
pub trait Host: Send + Sync {
    /// Ask for the freshly installed version to activate without waiting
    /// for existing clients to go away.
    async fn skip_waiting(&self);

    /// Start controlling already-open clients immediately.
    async fn claim_clients(&self);
}

/// Host that has no waiting phase and no clients to claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

#[async_trait]
impl Host for DetachedHost {
    async fn skip_waiting(&self) {
        tracing::debug!("skip_waiting requested; nothing is waiting");
    }

    async fn claim_clients(&self) {
        tracing::debug!("claim_clients requested; no clients attached");
    }
}
