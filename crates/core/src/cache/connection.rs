//! Store connection management with pragma configuration.
//!
//! Opens the SQLite database, applies the pragmas the worker relies on for
//! concurrent readers (WAL mode), and runs migrations before handing out a
//! handle.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Cache store handle.
///
/// Wraps a tokio-rusqlite Connection that runs every statement on a
/// background thread. Cloning is cheap and all clones share the connection,
/// so request tasks can each hold their own handle.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a store at the specified path.
    ///
    /// Creates the parent directory and file if missing, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::InvalidInput(format!("cannot create {}: {e}", parent.display())))?;
        }

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        tracing::debug!(path = %path.display(), "opened cache store");
        Self::configure(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
