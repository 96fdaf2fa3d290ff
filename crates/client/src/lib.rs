//! Network capability for swcache.
//!
//! This crate provides the `Network` trait the caching strategies talk to,
//! and an HTTP implementation of it built on reqwest.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Network, NetworkError, UrlError, resolve_asset};
