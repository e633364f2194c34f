//! Opening the ledger file and handing out scoped [`Ledger`] views onto it.

use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::Ledger;
use crate::error::{ErrorKind, Result};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Handle to the ledger file shared by every import scope.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

// Lookups run alongside the spool walk and writes alongside the uploads.
const POOL_SIZE: u32 = 5;

impl Database {
    /// Open (or create) the ledger file at `path`, creating missing parent
    /// directories, and bring its schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
        }
        debug!(path = %path.display(), "opening ledger");
        let db = Self::start(ledger_options().filename(path).create_if_missing(true), POOL_SIZE).await?;
        info!(path = %path.display(), records = db.total().await?, "ledger ready");
        Ok(db)
    }

    /// A throwaway ledger that lives as long as the returned handle.
    #[cfg(test)]
    pub(crate) async fn open_in_memory() -> Result<Self> {
        // Every connection to ":memory:" is a separate database.
        Self::start(ledger_options().filename(":memory:"), 1).await
    }

    async fn start(options: SqliteConnectOptions, connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(connections)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        MIGRATOR.run(&pool).await.or_raise(|| ErrorKind::Migration)?;
        Ok(Self { pool })
    }

    /// The records kept for one import target; see [`crate::scope`].
    pub fn ledger(&self, scope: impl Into<String>) -> Ledger {
        Ledger::new(self, scope)
    }

    /// Records across every scope.
    async fn total(&self) -> Result<i64> {
        let (total,): (i64,) = sqlx::query_as(include_str!("../queries/count_all.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(total)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Flush statistics and close every connection.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

fn ledger_options() -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        // Up to `concurrency` tasks share one writer; wait instead of SQLITE_BUSY.
        .busy_timeout(Duration::from_millis(1500))
        .pragma("wal_autocheckpoint", "800")
        .pragma("cache_size", "-4096")
        .pragma("temp_store", "MEMORY")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DedupStore, Record};

    #[tokio::test]
    async fn test_in_memory_ledger_closes() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_reopening_keeps_schema_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.sqlite");
        let db = Database::open(&path).await.unwrap();
        db.ledger("carol").put(&Record::new("/spool/INBOX/9.")).await.unwrap();
        db.close().await;

        let db = Database::open(&path).await.unwrap();
        assert_eq!(db.total().await.unwrap(), 1);
        db.close().await;
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("ledger.sqlite");
        let db = Database::open(&path).await.unwrap();
        // Pooled connections all carry the tuning, not just the first one.
        let mut first = db.pool().acquire().await.unwrap();
        let mut second = db.pool().acquire().await.unwrap();
        for conn in [&mut *first, &mut *second] {
            let (checkpoint,): (i64,) = sqlx::query_as("PRAGMA wal_autocheckpoint").fetch_one(&mut *conn).await.unwrap();
            assert_eq!(checkpoint, 800);
        }
        drop((first, second));
        db.close().await;
        assert!(path.exists());
    }
}
