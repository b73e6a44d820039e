//! Script/stylesheet strategy: stale-while-revalidate.
//!
//! A cached entry is returned immediately while a detached task refreshes
//! the runtime partition for next time. The cold path waits on the
//! network and caches the result. Revalidation failure is logged and
//! swallowed; the caller already has a response.

use std::sync::Arc;

use shellcache_client::{Network, NetworkRequest};
use shellcache_core::{CacheDb, PartitionKind};
use shellcache_core::cache::request_key;
use url::Url;

use super::store_quietly;
use crate::handler::CacheWorker;
use crate::request::{ServedFrom, WorkerResponse, snapshot};

fn spawn_revalidate(store: CacheDb, net: Arc<dyn Network>, runtime: String, url: Url) {
    tokio::spawn(async move {
        match net.fetch(&NetworkRequest::get(url.clone())).await {
            Ok(network_response) => {
                store_quietly(&store, &snapshot(&runtime, &network_response)).await;
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "background revalidation failed");
            }
        }
    });
}

pub(crate) async fn respond(worker: &CacheWorker, url: &Url) -> WorkerResponse {
    let runtime = worker.partitions.name(PartitionKind::Runtime);

    let cached = match worker.store.get_entry_any(&request_key(url.as_str())).await {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "cache lookup failed; treating as miss");
            None
        }
    };

    if let Some(entry) = cached {
        spawn_revalidate(worker.store.clone(), worker.net.clone(), runtime, url.clone());
        let partition = entry.cache_name.clone();
        return WorkerResponse::from_entry(entry, ServedFrom::Cache { partition });
    }

    match worker.net.fetch(&NetworkRequest::get(url.clone())).await {
        Ok(network_response) => {
            store_quietly(&worker.store, &snapshot(&runtime, &network_response)).await;
            WorkerResponse::from_network(&network_response)
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "asset fetch failed with no cached copy");
            WorkerResponse::synthesized(504, "text/plain", "asset unavailable offline")
        }
    }
}
