//! Caching proxy worker for a single web application.
//!
//! The worker intercepts the application's outgoing requests and decides,
//! per request class, whether to answer from its stores, from the network,
//! or both:
//!
//! - [`classify`] maps a request to a [`Classification`]
//! - [`strategy`] holds the three caching algorithms
//! - [`versions`] derives store names from the version tag and sweeps stale stores
//! - [`precache`] fills the precache store on install
//! - [`worker`] ties them together behind the lifecycle hooks

pub mod background;
pub mod classify;
pub mod host;
pub mod precache;
pub mod strategy;
pub mod versions;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use background::BackgroundWrites;
pub use classify::{Classification, RoutingRules};
pub use host::{DetachedHost, Host};
pub use precache::PrecacheLoader;
pub use strategy::{Strategy, StrategyEngine};
pub use versions::{SweepReport, VersionManager};
pub use worker::{FetchOutcome, Lifecycle, ServiceWorker};
