use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

/// Proof that an item was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Identifier the remote assigned to the item, when it returned one.
    pub remote_id: Option<String>,
    pub completed_at: UtcDateTime,
}

impl Record {
    /// A record completed now.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            remote_id: None,
            completed_at: UtcDateTime::now(),
        }
    }

    pub fn with_remote_id(mut self, remote_id: Option<String>) -> Self {
        self.remote_id = remote_id;
        self
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub(crate) key: String,
    pub(crate) remote_id: Option<String>,
    pub(crate) completed_at: i64,
}

impl From<&Record> for RecordRow {
    fn from(record: &Record) -> Self {
        Self {
            key: record.key.clone(),
            remote_id: record.remote_id.clone(),
            completed_at: record.completed_at.unix_timestamp(),
        }
    }
}

impl TryFrom<RecordRow> for Record {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.key,
            remote_id: row.remote_id,
            completed_at: UtcDateTime::from_unix_timestamp(row.completed_at)
                .or_raise(|| ErrorKind::InvalidData("completion date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let completed = UtcDateTime::now();
        let row = RecordRow {
            key: "/var/spool/imap/user/alice/Sent/12.".to_string(),
            remote_id: Some("18c2f0a9e1b".to_string()),
            completed_at: completed.unix_timestamp(),
        };
        let record = Record::try_from(row).unwrap();
        assert_eq!(record.remote_id.as_deref(), Some("18c2f0a9e1b"));
        // Unix timestamps are whole seconds.
        assert_eq!(record.completed_at, completed.replace_nanosecond(0).unwrap());
    }

    #[test]
    fn test_out_of_range_timestamp_is_rejected() {
        let row = RecordRow {
            key: "k".to_string(),
            remote_id: None,
            completed_at: i64::MAX,
        };
        let err = Record::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }
}
