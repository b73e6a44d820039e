//! Cache entry CRUD and partition maintenance.
//!
//! Entries are immutable response snapshots keyed by `(partition, key)`.
//! Writes use UPSERT semantics; the integer id assigned on first insert is
//! preserved across updates, so ordering by id is insertion order and
//! drives FIFO eviction.

use super::connection::CacheDb;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full partition name, e.g. `shellcache-v1-precache`.
    pub cache_name: String,
    /// Request key (SHA-256 of the canonical absolute URL).
    pub key: String,
    /// The canonical absolute URL the snapshot was captured from.
    pub url: String,
    /// HTTP status of the captured response.
    pub status: u16,
    pub content_type: Option<String>,
    /// Response headers as a JSON array of `[name, value]` pairs.
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    /// Capture timestamp (RFC3339), used for age-based eviction.
    pub stored_at: String,
}

impl CacheEntry {
    /// Decode the stored headers, tolerating absent or malformed JSON.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<CacheEntry, rusqlite::Error> {
    Ok(CacheEntry {
        cache_name: row.get(0)?,
        key: row.get(1)?,
        url: row.get(2)?,
        status: row.get::<_, i64>(3)? as u16,
        content_type: row.get(4)?,
        headers_json: row.get(5)?,
        body: row.get(6)?,
        stored_at: row.get(7)?,
    })
}

const ENTRY_COLUMNS: &str = "cache_name, key, url, status, content_type, headers_json, body, stored_at";

impl CacheDb {
    /// Insert or overwrite a snapshot.
    ///
    /// Last write wins for the same `(partition, key)`; the original
    /// insertion id is kept so FIFO order reflects first insertion, not
    /// the latest refresh.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (cache_name, key, url, status, content_type, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(cache_name, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &entry.cache_name,
                        &entry.key,
                        &entry.url,
                        entry.status as i64,
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a snapshot from one partition.
    ///
    /// Returns None on a miss.
    pub async fn get_entry(&self, cache_name: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        let cache_name = cache_name.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE cache_name = ?1 AND key = ?2"
                ))?;
                let result = stmt.query_row(params![cache_name, key], row_to_entry);
                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get a snapshot by key across all partitions.
    ///
    /// Used by navigation lookup, which must also see alias entries
    /// materialized into the precache partition. Prefers the most
    /// recently stored snapshot if several partitions hold the key.
    pub async fn get_entry_any(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE key = ?1 ORDER BY stored_at DESC LIMIT 1"
                ))?;
                let result = stmt.query_row(params![key], row_to_entry);
                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Copy a snapshot under a new key/url within the same partition.
    ///
    /// Used to materialize alias routes (e.g. `/` -> `/index.html`) so
    /// extensionless navigations resolve without a network round trip.
    /// Returns false if the source entry does not exist.
    pub async fn copy_entry(&self, cache_name: &str, from_key: &str, to_key: &str, to_url: &str) -> Result<bool, Error> {
        let cache_name = cache_name.to_string();
        let from_key = from_key.to_string();
        let to_key = to_key.to_string();
        let to_url = to_url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let copied = conn.execute(
                    "INSERT INTO entries (cache_name, key, url, status, content_type, headers_json, body, stored_at)
                     SELECT cache_name, ?3, ?4, status, content_type, headers_json, body, stored_at
                     FROM entries WHERE cache_name = ?1 AND key = ?2
                     ON CONFLICT(cache_name, key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![cache_name, from_key, to_key, to_url],
                )?;
                Ok(copied > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one snapshot. Returns true if an entry was removed.
    pub async fn delete_entry(&self, cache_name: &str, key: &str) -> Result<bool, Error> {
        let cache_name = cache_name.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE cache_name = ?1 AND key = ?2",
                    params![cache_name, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Enumerate all partition names present in the store.
    pub async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT cache_name FROM entries ORDER BY cache_name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a whole partition. Returns the number of entries removed.
    pub async fn delete_partition(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE cache_name = ?1", params![cache_name])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a partition.
    pub async fn count_entries(&self, cache_name: &str) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Trim a partition to at most `max_entries`, deleting in insertion
    /// order (oldest first). Returns the number of deleted entries.
    pub async fn trim_partition_fifo(&self, cache_name: &str, max_entries: usize) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![cache_name],
                    |row| row.get(0),
                )?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE id IN (
                        SELECT id FROM entries WHERE cache_name = ?1 ORDER BY id ASC LIMIT ?2
                    )",
                    params![cache_name, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries stored before `cutoff`.
    ///
    /// Entries whose `stored_at` does not parse as RFC3339 are not
    /// eligible for age-based eviction and are left in place; only
    /// count-based trimming removes them.
    pub async fn purge_older_than(&self, cache_name: &str, cutoff: DateTime<Utc>) -> Result<u64, Error> {
        let cache_name = cache_name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let mut stmt = conn.prepare("SELECT id, stored_at FROM entries WHERE cache_name = ?1")?;
                let rows = stmt
                    .query_map(params![cache_name], |row| {
                        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut deleted = 0u64;
                for (id, stored_at) in rows {
                    let Ok(parsed) = DateTime::parse_from_rfc3339(&stored_at) else {
                        continue;
                    };
                    if parsed.with_timezone(&Utc) < cutoff {
                        deleted += conn.execute("DELETE FROM entries WHERE id = ?1", params![id])? as u64;
                    }
                }
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }
}
