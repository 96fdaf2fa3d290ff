//! Canonical request keys.

use sha2::{Digest, Sha256};
use url::Url;

use crate::Request;

/// URL as used for matching: the fragment never takes part in a lookup.
pub fn canonical_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Compute the store key for a method and URL.
pub fn compute_cache_key(method: &str, url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_url(url).as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Store key for a request. Headers are ignored.
pub fn request_key(request: &Request) -> String {
    compute_cache_key(&request.method, &request.url)
}
