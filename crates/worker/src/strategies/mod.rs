//! Per-class caching strategies.
//!
//! Each strategy resolves to a [`WorkerResponse`](crate::request::WorkerResponse)
//! unconditionally: network and storage failures are logged and absorbed
//! by the class's fallback chain, never propagated to the page.
//!
//! Cache writes that the caller does not need to wait for (revalidation,
//! image trimming) run as detached tasks; their failures are swallowed
//! and logged.

pub mod asset;
pub mod data;
pub mod image;
pub mod navigation;
pub mod other;

use shellcache_core::{CacheDb, CacheEntry};

/// Store a snapshot, logging instead of failing. Quota or I/O problems
/// must not break a fetch whose response the caller already holds.
pub(crate) async fn store_quietly(store: &CacheDb, entry: &CacheEntry) {
    if let Err(e) = store.put_entry(entry).await {
        tracing::warn!(url = %entry.url, partition = %entry.cache_name, error = %e, "cache write failed");
    }
}
