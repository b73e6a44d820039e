//! Data strategy: network first with cache and static fallback.
//!
//! Online callers always get current data; the cached copy only serves
//! when the network fails. The final fallback is a structured error
//! payload, never a transport-level failure.

use shellcache_client::NetworkRequest;
use shellcache_core::PartitionKind;
use shellcache_core::cache::request_key;
use url::Url;

use super::store_quietly;
use crate::handler::CacheWorker;
use crate::request::{ServedFrom, WorkerResponse, snapshot};

const OFFLINE_JSON: &str = r#"{"error":"offline"}"#;

pub(crate) async fn respond(worker: &CacheWorker, url: &Url, accept: Option<&str>) -> WorkerResponse {
    let request = NetworkRequest::get(url.clone()).with_accept(accept.unwrap_or("application/json"));

    match worker.net.fetch(&request).await {
        Ok(network_response) => {
            let data = worker.partitions.name(PartitionKind::Data);
            store_quietly(&worker.store, &snapshot(&data, &network_response)).await;
            return WorkerResponse::from_network(&network_response);
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "data network fetch failed; falling back to cache");
        }
    }

    match worker.store.get_entry_any(&request_key(url.as_str())).await {
        Ok(Some(entry)) => {
            let partition = entry.cache_name.clone();
            return WorkerResponse::from_entry(entry, ServedFrom::Cache { partition });
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(url = %url, error = %e, "cache lookup failed; treating as miss"),
    }

    if let Some(fallback_path) = &worker.config.data_fallback
        && let Ok(fallback_url) = worker.resolve(fallback_path)
        && let Ok(Some(entry)) = worker.store.get_entry_any(&request_key(fallback_url.as_str())).await
    {
        return WorkerResponse::from_entry(entry, ServedFrom::Fallback);
    }

    WorkerResponse::synthesized(503, "application/json", OFFLINE_JSON)
}
