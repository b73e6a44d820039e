//! Image strategy: cache-first with a bounded partition.
//!
//! Hits are served straight from cache. Misses fetch, store, and kick off
//! a detached FIFO trim so the images partition never grows past the
//! configured entry count. Trimming never blocks the response.

use shellcache_client::NetworkRequest;
use shellcache_core::{CacheDb, PartitionKind};
use shellcache_core::cache::request_key;
use url::Url;

use super::store_quietly;
use crate::handler::CacheWorker;
use crate::request::{ServedFrom, WorkerResponse, snapshot};

fn spawn_trim(store: CacheDb, images: String, max_entries: usize) {
    tokio::spawn(async move {
        match store.trim_partition_fifo(&images, max_entries).await {
            Ok(0) => {}
            Ok(deleted) => tracing::debug!(partition = %images, deleted, "trimmed images partition"),
            Err(e) => tracing::warn!(partition = %images, error = %e, "image trim failed"),
        }
    });
}

pub(crate) async fn respond(worker: &CacheWorker, url: &Url) -> WorkerResponse {
    match worker.store.get_entry_any(&request_key(url.as_str())).await {
        Ok(Some(entry)) => {
            let partition = entry.cache_name.clone();
            return WorkerResponse::from_entry(entry, ServedFrom::Cache { partition });
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(url = %url, error = %e, "cache lookup failed; treating as miss"),
    }

    let images = worker.partitions.name(PartitionKind::Images);
    match worker.net.fetch(&NetworkRequest::get(url.clone())).await {
        Ok(network_response) => {
            store_quietly(&worker.store, &snapshot(&images, &network_response)).await;
            spawn_trim(worker.store.clone(), images, worker.config.image_max_entries);
            WorkerResponse::from_network(&network_response)
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "image fetch failed");
            if let Some(fallback_path) = &worker.config.image_fallback
                && let Ok(fallback_url) = worker.resolve(fallback_path)
                && let Ok(Some(entry)) = worker.store.get_entry_any(&request_key(fallback_url.as_str())).await
            {
                return WorkerResponse::from_entry(entry, ServedFrom::Fallback);
            }
            WorkerResponse::synthesized(503, "text/plain", "image unavailable offline")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FetchRequest;
    use crate::testutil::{precache, wait_for, worker_with};
    use shellcache_core::AppConfig;

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.insert("http://localhost:8080/images/photo1.webp", "image/webp", vec![1, 2, 3]);

        let request = FetchRequest::get("http://localhost:8080/images/photo1.webp");
        let outcome = worker.handle_fetch(&request).await;
        assert_eq!(outcome.response().unwrap().served_from, ServedFrom::Network);

        // Second request is a pure cache hit even with one network fetch.
        let outcome = worker.handle_fetch(&request).await;
        let response = outcome.response().unwrap();
        assert!(matches!(response.served_from, ServedFrom::Cache { .. }));
        assert_eq!(response.body.as_ref(), &[1, 2, 3]);
        assert_eq!(net.fetch_count("http://localhost:8080/images/photo1.webp"), 1);
    }

    #[tokio::test]
    async fn test_offline_idempotent_snapshots() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.insert("http://localhost:8080/images/photo1.webp", "image/webp", vec![9, 9, 9]);

        let request = FetchRequest::get("http://localhost:8080/images/photo1.webp");
        worker.handle_fetch(&request).await;
        net.set_offline(true);

        let first = worker.handle_fetch(&request).await;
        let second = worker.handle_fetch(&request).await;
        assert_eq!(first.response().unwrap().body, second.response().unwrap().body);
    }

    #[tokio::test]
    async fn test_bounded_growth_evicts_oldest() {
        let config = AppConfig { image_max_entries: 3, ..Default::default() };
        let (worker, net) = worker_with(config).await;

        for i in 0..5 {
            let url = format!("http://localhost:8080/images/photo{i}.webp");
            net.insert(&url, "image/webp", vec![i]);
            worker.handle_fetch(&FetchRequest::get(&url)).await;
        }

        let images = worker.partitions().name(PartitionKind::Images);
        let store = worker.store().clone();
        wait_for(|| {
            let store = store.clone();
            let images = images.clone();
            async move { store.count_entries(&images).await.unwrap() <= 3 }
        })
        .await;

        // The oldest-inserted entries are the evicted ones.
        let oldest = request_key("http://localhost:8080/images/photo0.webp");
        let newest = request_key("http://localhost:8080/images/photo4.webp");
        assert!(worker.store().get_entry(&images, &oldest).await.unwrap().is_none());
        assert!(worker.store().get_entry(&images, &newest).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failure_serves_placeholder() {
        let config = AppConfig { image_fallback: Some("/assets/logo.png".into()), ..Default::default() };
        let (worker, net) = worker_with(config).await;
        precache(&worker, "/assets/logo.png", "image/png", b"logo-bytes").await;
        net.set_offline(true);

        let request = FetchRequest::get("http://localhost:8080/images/missing.webp");
        let outcome = worker.handle_fetch(&request).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.served_from, ServedFrom::Fallback);
        assert_eq!(response.body.as_ref(), b"logo-bytes");
    }

    #[tokio::test]
    async fn test_failure_without_placeholder_synthesizes() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.set_offline(true);

        let request = FetchRequest::get("http://localhost:8080/images/missing.webp");
        let outcome = worker.handle_fetch(&request).await;
        assert_eq!(outcome.response().unwrap().status, 503);
    }
}
