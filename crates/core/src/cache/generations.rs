//! Generation bookkeeping: enumeration, eviction and the current marker.

use super::connection::CacheDb;
use crate::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

const CURRENT_GENERATION: &str = "current_generation";

/// Entry count for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: String,
    pub entries: u64,
}

/// Outcome of [`CacheDb::evict_all_except`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eviction {
    pub evicted_generations: Vec<String>,
    pub deleted_entries: u64,
}

impl CacheDb {
    /// Distinct generation ids that currently own at least one entry.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT generation FROM cache_entries ORDER BY generation")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry counts grouped by generation.
    pub async fn generation_stats(&self) -> Result<Vec<GenerationStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT generation, COUNT(*) FROM cache_entries GROUP BY generation ORDER BY generation",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(GenerationStats { generation: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry owned by `generation`.
    ///
    /// Returns the number of deleted entries; deleting an absent generation
    /// is not an error.
    pub async fn delete_generation(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE generation = ?1", params![generation])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry not owned by `keep` and record `keep` as current.
    ///
    /// Enumeration, deletion and the marker update run in one transaction.
    /// Re-running with the same `keep` deletes nothing further and leaves
    /// the marker unchanged.
    pub async fn evict_all_except(&self, keep: &str) -> Result<Eviction, Error> {
        let keep = keep.to_string();
        self.conn
            .call(move |conn| -> Result<Eviction, Error> {
                let tx = conn.transaction()?;

                let stale: Vec<String> = {
                    let mut stmt = tx.prepare(
                        "SELECT DISTINCT generation FROM cache_entries WHERE generation != ?1 ORDER BY generation",
                    )?;
                    stmt.query_map(params![keep], |row| row.get(0))?
                        .collect::<Result<Vec<String>, _>>()?
                };

                let mut deleted = 0u64;
                for generation in &stale {
                    deleted +=
                        tx.execute("DELETE FROM cache_entries WHERE generation = ?1", params![generation])? as u64;
                }

                write_marker(&tx, CURRENT_GENERATION, &keep)?;
                tx.commit()?;

                Ok(Eviction { evicted_generations: stale, deleted_entries: deleted })
            })
            .await
            .map_err(Error::from)
    }

    /// The generation last recorded as current, if any.
    pub async fn current_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let value = conn
                    .query_row(
                        "SELECT value FROM worker_state WHERE name = ?1",
                        params![CURRENT_GENERATION],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await
            .map_err(Error::from)
    }
}

fn write_marker(conn: &rusqlite::Connection, name: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO worker_state (name, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![name, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
