//! shellcache entry point.
//!
//! Deploy-time cache warmer: loads configuration, opens the cache store,
//! runs the install phase against the live site, then activates so stale
//! partitions from previous version tokens are garbage-collected.
//! Logging goes to stderr.

use std::sync::Arc;

use anyhow::Result;
use shellcache_client::{FetchConfig, HttpClient};
use shellcache_core::{AppConfig, CacheDb};
use shellcache_worker::{CacheWorker, ServiceWorker};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        version = %config.version,
        manifest_entries = config.precache_manifest.len(),
        "starting shellcache"
    );

    let store = CacheDb::open(&config.db_path).await?;
    let client = HttpClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let worker = CacheWorker::new(store, Arc::new(client), config)?;
    let service = ServiceWorker::new(worker);

    let install = service.install().await;
    for path in &install.failed {
        tracing::warn!(path = %path, "manifest entry not precached");
    }

    let activate = service.activate().await?;

    tracing::info!(
        cached = install.cached,
        failed = install.failed.len(),
        aliased = install.aliased,
        removed_partitions = activate.removed_partitions.len(),
        purged_images = activate.purged_images,
        "cache warm complete"
    );

    Ok(())
}
