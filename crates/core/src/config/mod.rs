//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::PartitionSet;

mod validation;

pub use validation::ConfigError;

/// A short-route-to-canonical-resource pair.
///
/// Alias entries are materialized into the precache partition at install
/// time so extensionless navigations (`/` for `/index.html`) resolve
/// without a network round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub route: String,
    pub target: String,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker controls. Requests to any other origin are
    /// passed through untouched; manifest paths resolve against this.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version token embedded in every partition name. Bumping it and
    /// re-activating is the sole cache-invalidation mechanism.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix for partition names.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// App-shell manifest: site-relative URLs precached at install.
    #[serde(default)]
    pub precache_manifest: Vec<String>,

    /// Hostnames never intercepted even when same-origin matching would
    /// otherwise apply (analytics, fonts, CDNs). Matched by suffix.
    #[serde(default = "default_bypass_hosts")]
    pub bypass_hosts: Vec<String>,

    /// Alias routes copied onto canonical precache entries at install.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<Alias>,

    /// The app-shell root document navigations degrade to.
    #[serde(default = "default_shell_document")]
    pub shell_document: String,

    /// Offline fallback page, the final step of the navigation chain.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Static data resource served when a JSON request fails offline
    /// with no cached copy.
    #[serde(default)]
    pub data_fallback: Option<String>,

    /// Placeholder image served when an image fetch fails uncached.
    #[serde(default)]
    pub image_fallback: Option<String>,

    /// Maximum entry count of the images partition (FIFO-trimmed).
    #[serde(default = "default_image_max_entries")]
    pub image_max_entries: usize,

    /// Images older than this many days are purged during activation.
    /// None disables age-based eviction.
    #[serde(default = "default_image_max_age_days")]
    pub image_max_age_days: Option<i64>,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_cache_prefix() -> String {
    "shellcache".into()
}

fn default_bypass_hosts() -> Vec<String> {
    [
        "googletagmanager.com",
        "google-analytics.com",
        "fonts.googleapis.com",
        "fonts.gstatic.com",
        "cdnjs.cloudflare.com",
        "cdn.jsdelivr.net",
    ]
    .map(String::from)
    .to_vec()
}

fn default_aliases() -> Vec<Alias> {
    vec![Alias { route: "/".into(), target: "/index.html".into() }]
}

fn default_shell_document() -> String {
    "/index.html".into()
}

fn default_offline_fallback() -> String {
    "/offline.html".into()
}

fn default_image_max_entries() -> usize {
    60
}

fn default_image_max_age_days() -> Option<i64> {
    Some(30)
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            precache_manifest: Vec::new(),
            bypass_hosts: default_bypass_hosts(),
            aliases: default_aliases(),
            shell_document: default_shell_document(),
            offline_fallback: default_offline_fallback(),
            data_fallback: None,
            image_fallback: None,
            image_max_entries: default_image_max_entries(),
            image_max_age_days: default_image_max_age_days(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Partition names for the configured version token.
    pub fn partitions(&self) -> PartitionSet {
        PartitionSet::new(&self.cache_prefix, &self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
