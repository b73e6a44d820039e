//! Catch-all strategy for same-origin requests with no better class:
//! network, falling back to cache on failure. No write-through caching.

use shellcache_client::NetworkRequest;
use shellcache_core::cache::request_key;
use url::Url;

use crate::handler::CacheWorker;
use crate::request::{ServedFrom, WorkerResponse};

pub(crate) async fn respond(worker: &CacheWorker, url: &Url) -> WorkerResponse {
    match worker.net.fetch(&NetworkRequest::get(url.clone())).await {
        Ok(network_response) => WorkerResponse::from_network(&network_response),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "fetch failed; trying cache");
            match worker.store.get_entry_any(&request_key(url.as_str())).await {
                Ok(Some(entry)) => {
                    let partition = entry.cache_name.clone();
                    WorkerResponse::from_entry(entry, ServedFrom::Cache { partition })
                }
                Ok(None) => WorkerResponse::synthesized(503, "text/plain", "unavailable offline"),
                Err(storage_error) => {
                    tracing::warn!(url = %url, error = %storage_error, "cache lookup failed");
                    WorkerResponse::synthesized(503, "text/plain", "unavailable offline")
                }
            }
        }
    }
}
