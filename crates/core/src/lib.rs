//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response value types shared by the network and the stores
//! - Named cache stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod message;
pub mod store;

pub use config::{ConfigError, WorkerConfig};
pub use error::Error;
pub use message::{Headers, Request, RequestMode, Response};
pub use store::{CacheDb, CacheStorage, Store};
