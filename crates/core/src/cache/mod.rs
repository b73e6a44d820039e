//! SQLite-backed partitioned response cache.
//!
//! This module provides a persistent, same-origin response store using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named cache partitions with version-token-based bulk invalidation
//! - Request keys derived from canonical absolute URLs (SHA-256)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - FIFO trimming and age-based purging per partition

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod partition;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use key::request_key;
pub use partition::{PartitionKind, PartitionSet};
