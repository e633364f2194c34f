use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Record, RecordRow};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::trace;

/// Persistent "already done" marker per item key.
///
/// Records only ever grow: nothing in this workspace deletes one.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Record>>;

    /// Stores a record. Storing a key that is already present is a no-op.
    async fn put(&self, record: &Record) -> Result<()>;

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Ledger scope for an import into `account`, optionally under a forced
/// subfolder label.
pub fn scope(account: &str, subfolder: Option<&str>) -> String {
    match subfolder {
        Some(subfolder) => format!("{account}/{subfolder}"),
        None => account.to_string(),
    }
}

/// [`DedupStore`] backed by the `completed` table, restricted to one scope.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
    scope: String,
}

impl Ledger {
    pub(crate) fn new(db: &Database, scope: impl Into<String>) -> Self {
        Self {
            pool: db.pool().clone(),
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Number of items recorded in this scope.
    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(include_str!("../queries/count_completed.sql"))
            .bind(&self.scope)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("record count"))
    }
}

#[async_trait]
impl DedupStore for Ledger {
    async fn get(&self, key: &str) -> Result<Option<Record>> {
        let row: Option<RecordRow> = sqlx::query_as(include_str!("../queries/get_completed.sql"))
            .bind(&self.scope)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Record::try_from).transpose()
    }

    async fn put(&self, record: &Record) -> Result<()> {
        let row = RecordRow::from(record);
        let result = sqlx::query(include_str!("../queries/insert_completed.sql"))
            .bind(&self.scope)
            .bind(row.key)
            .bind(row.remote_id)
            .bind(row.completed_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        trace!(key = %record.key, inserted = result.rows_affected(), "recorded completion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn ledger(scope: &str) -> (Database, Ledger) {
        let db = Database::open_in_memory().await.unwrap();
        let ledger = db.ledger(scope);
        (db, ledger)
    }

    #[rstest]
    #[case("alice@example.com", None, "alice@example.com")]
    #[case("alice@example.com", Some("Archive2020"), "alice@example.com/Archive2020")]
    fn test_scope(#[case] account: &str, #[case] subfolder: Option<&str>, #[case] expected: &str) {
        assert_eq!(scope(account, subfolder), expected);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_db, ledger) = ledger("alice@example.com").await;
        assert!(ledger.get("/spool/INBOX/1.").await.unwrap().is_none());

        let record = Record::new("/spool/INBOX/1.").with_remote_id(Some("abc".to_string()));
        ledger.put(&record).await.unwrap();

        let found = ledger.get("/spool/INBOX/1.").await.unwrap().unwrap();
        assert_eq!(found.key, "/spool/INBOX/1.");
        assert_eq!(found.remote_id.as_deref(), Some("abc"));
        assert!(ledger.contains("/spool/INBOX/1.").await.unwrap());
        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_put_keeps_first_record() {
        let (_db, ledger) = ledger("alice@example.com").await;
        ledger.put(&Record::new("k").with_remote_id(Some("first".to_string()))).await.unwrap();
        ledger.put(&Record::new("k").with_remote_id(Some("second".to_string()))).await.unwrap();
        let found = ledger.get("k").await.unwrap().unwrap();
        assert_eq!(found.remote_id.as_deref(), Some("first"));
        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let db = Database::open_in_memory().await.unwrap();
        let plain = Ledger::new(&db, scope("alice@example.com", None));
        let archived = Ledger::new(&db, scope("alice@example.com", Some("Archive2020")));
        plain.put(&Record::new("/spool/INBOX/1.")).await.unwrap();
        assert!(plain.contains("/spool/INBOX/1.").await.unwrap());
        assert!(!archived.contains("/spool/INBOX/1.").await.unwrap());
        assert_eq!(archived.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_records_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.sqlite");
        {
            let db = Database::open(&path).await.unwrap();
            Ledger::new(&db, "bob").put(&Record::new("/spool/Sent/3.")).await.unwrap();
            db.close().await;
        }
        let db = Database::open(&path).await.unwrap();
        assert!(Ledger::new(&db, "bob").contains("/spool/Sent/3.").await.unwrap());
        db.close().await;
    }
}
