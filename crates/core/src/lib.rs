//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Versioned partition naming for bulk invalidation
//! - Layered application configuration
//! - Unified error types

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, PartitionKind, PartitionSet};
pub use config::{Alias, AppConfig};
pub use error::Error;
