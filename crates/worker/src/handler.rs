//! The cache worker: guards, classification, and strategy dispatch.

use std::sync::Arc;

use shellcache_client::{Network, fetch::url as urls};
use shellcache_core::{AppConfig, CacheDb, Error, PartitionSet};
use url::Url;

use crate::request::{FetchOutcome, FetchRequest};
use crate::router::{self, RequestClass};
use crate::strategies;

/// The offline cache controller.
///
/// Holds the injected collaborators (store, network, configuration) and
/// resolves every intercepted request to a [`FetchOutcome`]. All state is
/// shared and immutable; concurrent requests are handled independently.
pub struct CacheWorker {
    pub(crate) store: CacheDb,
    pub(crate) net: Arc<dyn Network>,
    pub(crate) config: AppConfig,
    pub(crate) origin: Url,
    pub(crate) partitions: PartitionSet,
}

impl CacheWorker {
    pub fn new(store: CacheDb, net: Arc<dyn Network>, config: AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let partitions = config.partitions();
        Ok(Self { store, net, config, origin, partitions })
    }

    pub fn store(&self) -> &CacheDb {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.partitions
    }

    /// Resolve a site-relative path (manifest entry, alias, fallback)
    /// against the configured origin.
    pub(crate) fn resolve(&self, path: &str) -> Result<Url, Error> {
        urls::resolve(&self.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))
    }

    /// Hosts on the bypass list are never intercepted, even though the
    /// platform would let us. Matched as domain suffix so `www.` and
    /// other subdomains are covered.
    fn is_bypass_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        self.config
            .bypass_hosts
            .iter()
            .any(|bypass| host == bypass || host.ends_with(&format!(".{bypass}")))
    }

    /// Handle one intercepted request.
    ///
    /// Never returns an error: guard failures become [`FetchOutcome::Passthrough`]
    /// and strategy-level failures are absorbed by per-class fallback
    /// chains, so no interception is ever left unresolved.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if !request.method.eq_ignore_ascii_case("GET") {
            return FetchOutcome::Passthrough;
        }

        let url = match urls::canonicalize(&request.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "malformed request url; passing through");
                return FetchOutcome::Passthrough;
            }
        };

        if url.origin() != self.origin.origin() || self.is_bypass_host(&url) {
            return FetchOutcome::Passthrough;
        }

        let class = router::classify(request, &url);
        tracing::debug!(url = %url, ?class, "dispatching intercepted request");

        let response = match class {
            RequestClass::Navigation => strategies::navigation::respond(self, &url).await,
            RequestClass::Data => strategies::data::respond(self, &url, request.accept.as_deref()).await,
            RequestClass::Asset => strategies::asset::respond(self, &url).await,
            RequestClass::Image => strategies::image::respond(self, &url).await,
            RequestClass::Other => strategies::other::respond(self, &url).await,
        };

        FetchOutcome::Respond(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::worker_with;
    use shellcache_core::AppConfig;

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let (worker, _net) = worker_with(AppConfig::default()).await;
        let request = FetchRequest::get("http://localhost:8080/chat").with_method("POST");
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_malformed_url_passes_through() {
        let (worker, _net) = worker_with(AppConfig::default()).await;
        let request = FetchRequest::get("http://exa mple.com/<>");
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_cross_origin_passes_through() {
        let (worker, _net) = worker_with(AppConfig::default()).await;
        let request = FetchRequest::get("https://elsewhere.example/script.js");
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_bypass_host_passes_through() {
        let config = AppConfig { origin: "https://www.googletagmanager.com".into(), ..Default::default() };
        let (worker, _net) = worker_with(config).await;
        // Same origin, but the host is on the bypass list.
        let request = FetchRequest::get("https://www.googletagmanager.com/gtag/js?id=G-XYZ");
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_same_origin_get_is_intercepted() {
        let (worker, net) = worker_with(AppConfig::default()).await;
        net.insert("http://localhost:8080/assets/style.css", "text/css", b"body{}".to_vec());

        let request = FetchRequest::get("http://localhost:8080/assets/style.css");
        let outcome = worker.handle_fetch(&request).await;
        let response = outcome.response().expect("should intercept");
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_ref(), b"body{}");
    }
}
