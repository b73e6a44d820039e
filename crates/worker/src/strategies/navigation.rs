//! Navigation strategy: cache-lookup chain with shell and offline fallback.
//!
//! Resolution order:
//! 1. exact cached match across all partitions (covers install aliases)
//! 2. path variants (`+.html`, `+/index.html`) in fixed order
//! 3. the cached app-shell document
//! 4. live network, opportunistically stored into the runtime partition
//! 5. the cached offline fallback page
//! 6. a synthesized 503 HTML response
//!
//! A page known at install time is always resolvable without network; an
//! unknown path degrades to the shell rather than a hard failure.

use shellcache_client::NetworkRequest;
use shellcache_core::PartitionKind;
use shellcache_core::cache::request_key;
use url::Url;

use super::store_quietly;
use crate::handler::CacheWorker;
use crate::request::{ServedFrom, WorkerResponse, snapshot};

const OFFLINE_HTML: &str = "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>Offline</title></head>\
<body><h1>You are offline</h1><p>This page is not available offline.</p></body></html>";

/// Path variants checked when the exact URL is not cached, in fixed order.
fn path_variants(path: &str) -> Vec<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // The root path's canonical page is covered by the alias map.
        return Vec::new();
    }
    vec![format!("{trimmed}.html"), format!("{trimmed}/index.html")]
}

async fn cached_any(worker: &CacheWorker, url: &Url) -> Option<WorkerResponse> {
    match worker.store.get_entry_any(&request_key(url.as_str())).await {
        Ok(Some(entry)) => {
            let partition = entry.cache_name.clone();
            Some(WorkerResponse::from_entry(entry, ServedFrom::Cache { partition }))
        }
        Ok(None) => None,
        Err(e) => {
            // A failed lookup is a cache miss, not an error; activation
            // may be deleting partitions underneath us.
            tracing::warn!(url = %url, error = %e, "cache lookup failed; treating as miss");
            None
        }
    }
}

async fn cached_relative(worker: &CacheWorker, path: &str) -> Option<WorkerResponse> {
    let url = worker.resolve(path).ok()?;
    cached_any(worker, &url).await
}

pub(crate) async fn respond(worker: &CacheWorker, url: &Url) -> WorkerResponse {
    if let Some(response) = cached_any(worker, url).await {
        return response;
    }

    for variant in path_variants(url.path()) {
        if let Some(response) = cached_relative(worker, &variant).await {
            tracing::debug!(url = %url, variant = %variant, "navigation resolved via path variant");
            return response;
        }
    }

    if let Some(response) = cached_relative(worker, &worker.config.shell_document).await {
        return response;
    }

    let request = NetworkRequest::get(url.clone()).with_accept("text/html,application/xhtml+xml");
    match worker.net.fetch(&request).await {
        Ok(network_response) => {
            let runtime = worker.partitions.name(PartitionKind::Runtime);
            store_quietly(&worker.store, &snapshot(&runtime, &network_response)).await;
            WorkerResponse::from_network(&network_response)
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "navigation network fetch failed");
            match cached_relative(worker, &worker.config.offline_fallback).await {
                Some(mut offline) => {
                    offline.served_from = ServedFrom::Fallback;
                    offline
                }
                None => WorkerResponse::synthesized(503, "text/html; charset=utf-8", OFFLINE_HTML),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FetchRequest;
    use crate::testutil::{precache, worker_with};
    use shellcache_core::AppConfig;

    fn navigate(url: &str) -> FetchRequest {
        FetchRequest::navigation(url)
    }

    #[tokio::test]
    async fn test_exact_cached_match() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        precache(&worker, "/doctors.html", "text/html", b"<h1>doctors</h1>").await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/doctors.html")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.body.as_ref(), b"<h1>doctors</h1>");
        assert!(matches!(response.served_from, ServedFrom::Cache { .. }));
    }

    #[tokio::test]
    async fn test_html_variant_resolves_extensionless_path() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        precache(&worker, "/doctors.html", "text/html", b"<h1>doctors</h1>").await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/doctors")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.body.as_ref(), b"<h1>doctors</h1>");
    }

    #[tokio::test]
    async fn test_index_variant_resolves_directory_path() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        precache(&worker, "/blog/index.html", "text/html", b"<h1>blog</h1>").await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/blog/")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.body.as_ref(), b"<h1>blog</h1>");
    }

    #[tokio::test]
    async fn test_unknown_path_degrades_to_shell() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        precache(&worker, "/index.html", "text/html", b"<h1>shell</h1>").await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/never-heard-of-it")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.body.as_ref(), b"<h1>shell</h1>");
    }

    #[tokio::test]
    async fn test_network_fetch_stores_into_runtime() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.insert("http://localhost:8080/fresh-page", "text/html", b"<h1>fresh</h1>".to_vec());

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/fresh-page")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.served_from, ServedFrom::Network);

        let runtime = worker.partitions().name(PartitionKind::Runtime);
        let key = request_key("http://localhost:8080/fresh-page");
        assert!(worker.store().get_entry(&runtime, &key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_uncached_returns_offline_page() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        precache(&worker, "/offline.html", "text/html", b"<h1>offline</h1>").await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/nowhere")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.body.as_ref(), b"<h1>offline</h1>");
        assert_eq!(response.served_from, ServedFrom::Fallback);
    }

    #[tokio::test]
    async fn test_offline_nothing_cached_synthesizes_html() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.set_offline(true);

        let outcome = worker.handle_fetch(&navigate("http://localhost:8080/nowhere")).await;
        let response = outcome.response().unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.served_from, ServedFrom::Synthesized);
        assert!(response.content_type.as_deref().unwrap().starts_with("text/html"));
    }

    #[test]
    fn test_path_variants_fixed_order() {
        assert_eq!(path_variants("/doctors"), vec!["/doctors.html", "/doctors/index.html"]);
        assert_eq!(path_variants("/blog/"), vec!["/blog.html", "/blog/index.html"]);
        assert!(path_variants("/").is_empty());
    }
}
