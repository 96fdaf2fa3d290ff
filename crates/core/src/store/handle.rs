//! Handle to one named store.

use std::fmt;
use std::sync::Arc;

use url::Url;

use super::CacheStorage;
use crate::{Error, Request, Response};

/// A named store bound to its provider.
///
/// Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct Store {
    name: String,
    storage: Arc<dyn CacheStorage>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Store {
    /// Open the named store, creating it if it does not exist.
    pub async fn open(storage: Arc<dyn CacheStorage>, name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        storage.open(&name).await?;
        Ok(Self { name, storage })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        self.storage.lookup(&self.name, request).await
    }

    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.storage.put(&self.name, request, response).await
    }

    pub async fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.storage.put_all(&self.name, entries).await
    }

    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        self.storage.delete(&self.name, request).await
    }

    pub async fn keys(&self) -> Result<Vec<Url>, Error> {
        self.storage.keys(&self.name).await
    }
}
