//! Install and activation phases.
//!
//! Install precaches the app shell on a best-effort basis and
//! materializes alias routes. Activation garbage-collects every partition
//! that doesn't belong to the current version token, optionally purges
//! stale images, and is idempotent.

use shellcache_client::NetworkRequest;
use shellcache_core::{Error, PartitionKind};
use shellcache_core::cache::request_key;

use crate::handler::CacheWorker;
use crate::request::snapshot;

/// Outcome of the install phase.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Manifest entries successfully fetched and stored.
    pub cached: usize,
    /// Manifest entries that failed (resolve, fetch, or store). Install
    /// still completes; these are absent from the precache partition.
    pub failed: Vec<String>,
    /// Alias routes copied onto canonical precache entries.
    pub aliased: usize,
}

/// Outcome of the activation phase.
#[derive(Debug, Clone, Default)]
pub struct ActivateReport {
    /// Stale partitions deleted (anything not current-version).
    pub removed_partitions: Vec<String>,
    /// Image entries purged by age.
    pub purged_images: u64,
}

impl CacheWorker {
    /// Populate the precache partition from the manifest.
    ///
    /// Each entry is fetched fresh (bypassing intermediary caches). A
    /// failure for one entry is recorded and logged but never aborts the
    /// rest. After precaching, alias routes are copied onto their
    /// canonical entries so extensionless navigations resolve offline.
    pub async fn install(&self) -> InstallReport {
        let precache = self.partitions.name(PartitionKind::Precache);
        let mut report = InstallReport::default();

        for path in &self.config.precache_manifest {
            let url = match self.resolve(path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "precache entry has an unresolvable path");
                    report.failed.push(path.clone());
                    continue;
                }
            };

            let request = NetworkRequest::get(url.clone()).fresh();
            let response = match self.net.fetch(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "precache fetch failed");
                    report.failed.push(path.clone());
                    continue;
                }
            };

            if let Err(e) = self.store.put_entry(&snapshot(&precache, &response)).await {
                tracing::warn!(url = %url, error = %e, "precache store failed");
                report.failed.push(path.clone());
                continue;
            }
            report.cached += 1;
        }

        report.aliased = self.materialize_aliases(&precache).await;

        tracing::info!(
            cached = report.cached,
            failed = report.failed.len(),
            aliased = report.aliased,
            partition = %precache,
            "install complete"
        );
        report
    }

    /// Copy each alias route's canonical entry under the route's key.
    async fn materialize_aliases(&self, precache: &str) -> usize {
        let mut aliased = 0;
        for alias in &self.config.aliases {
            let (Ok(route_url), Ok(target_url)) = (self.resolve(&alias.route), self.resolve(&alias.target)) else {
                tracing::warn!(route = %alias.route, target = %alias.target, "alias does not resolve");
                continue;
            };
            let from_key = request_key(target_url.as_str());
            let to_key = request_key(route_url.as_str());
            match self.store.copy_entry(precache, &from_key, &to_key, route_url.as_str()).await {
                Ok(true) => aliased += 1,
                Ok(false) => {
                    tracing::debug!(target = %alias.target, "alias target not precached; skipping");
                }
                Err(e) => {
                    tracing::warn!(route = %alias.route, error = %e, "alias copy failed");
                }
            }
        }
        aliased
    }

    /// Make the current version's partitions the only live generation.
    ///
    /// Deletes every partition whose name is not one of the four
    /// current-version names; this is the sole garbage-collection
    /// mechanism. Optionally purges images older than the configured
    /// maximum age. Running it again with no intervening install is a
    /// no-op beyond the re-scan.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let mut report = ActivateReport::default();

        for partition in self.store.list_partitions().await? {
            if self.partitions.is_current(&partition) {
                continue;
            }
            let deleted = self.store.delete_partition(&partition).await?;
            tracing::info!(partition = %partition, entries = deleted, "deleted stale partition");
            report.removed_partitions.push(partition);
        }

        if let Some(max_age_days) = self.config.image_max_age_days {
            let images = self.partitions.name(PartitionKind::Images);
            let cutoff = chrono::Utc::now() - chrono::Duration::days(max_age_days);
            report.purged_images = self.store.purge_older_than(&images, cutoff).await?;
            if report.purged_images > 0 {
                tracing::info!(purged = report.purged_images, "purged stale images");
            }
        }

        Ok(report)
    }
}
