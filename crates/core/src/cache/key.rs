//! Request key derivation.
//!
//! A request key is the SHA-256 of the canonical absolute URL. Only GET
//! requests are ever keyed; the caller canonicalizes (lowercased host,
//! fragment stripped, query preserved) before deriving the key.

use sha2::{Digest, Sha256};

/// Compute the cache key for a canonical absolute URL.
pub fn request_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
