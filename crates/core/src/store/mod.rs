//! Named cache stores for request/response pairs.
//!
//! A store is a persistent mapping from a canonical request key to a captured
//! response. The worker talks to stores through the object-safe
//! [`CacheStorage`] trait; [`CacheDb`] is the SQLite implementation.
//!
//! - Requests are keyed by method and URL (fragment removed), headers ignored
//! - Writes replace an entry wholesale, never patch it
//! - Stores are opened with open-or-create semantics and only removed by
//!   [`CacheStorage::delete_store`]

pub mod connection;
pub mod entries;
pub mod handle;
pub mod key;
pub mod migrations;

use async_trait::async_trait;
use url::Url;

pub use crate::Error;
use crate::{Request, Response};

pub use connection::CacheDb;
pub use handle::Store;

/// Persistent store provider.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Look up a request in one store. A missing store is a miss.
    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up a request in every store, oldest store first.
    async fn lookup_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    /// Insert or replace one entry, creating the store if needed.
    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Insert or replace a batch of entries in a single transaction.
    ///
    /// Either every entry is committed or none is.
    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error>;

    /// Remove one entry. Returns whether anything was removed.
    async fn delete(&self, name: &str, request: &Request) -> Result<bool, Error>;

    /// Drop a whole store with its entries. Returns whether it existed.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Names of all existing stores in creation order.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// URLs of the entries held by one store.
    async fn keys(&self, name: &str) -> Result<Vec<Url>, Error>;
}
