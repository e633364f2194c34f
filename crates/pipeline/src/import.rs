//! Sending one spool entry.

use crate::Context;
use crate::error::ErrorKind;
use crate::source::Candidate;
use exn::ResultExt;
use mailport_executor::{ActionResult, FailureCode, WorkItem};
use mailport_ledger::Record;
use mailport_naming::LabelTable;
use mailport_remote::{ItemMetadata, into_action};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// An entry the remote confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    /// Path relative to the spool root.
    pub path: PathBuf,
    pub label: String,
    pub remote_id: Option<String>,
}

/// Work item that reads a candidate, sends it under its folder's label and
/// records it in the ledger.
pub fn work_item(ctx: Arc<Context>, table: Arc<LabelTable>, candidate: Candidate) -> WorkItem<Sent> {
    let key = candidate.key.clone();
    let candidate = Arc::new(candidate);
    WorkItem::new(key, move || send(ctx.clone(), table.clone(), candidate.clone()))
}

async fn send(ctx: Arc<Context>, table: Arc<LabelTable>, candidate: Arc<Candidate>) -> ActionResult<Sent> {
    let entry = &candidate.entry;
    let label = ctx.mapper().map(&entry.folder()).or_raise(|| FailureCode::BadRequest)?;
    let Some(label_id) = table.get(&label) else {
        let err = exn::Exn::from(ErrorKind::MissingLabel(label));
        return Err(err.raise(FailureCode::BadRequest));
    };

    let payload = match ctx.spool().read(&entry.path).await {
        Ok(payload) => payload,
        Err(err) => {
            let code = if err.is_retryable() {
                FailureCode::Unknown
            } else {
                FailureCode::BadRequest
            };
            return Err(err.raise(code));
        },
    };
    let metadata = ItemMetadata {
        source: entry.path.display().to_string(),
    };
    let ack = ctx
        .remote()
        .send_item(ctx.account(), label_id, payload, &metadata)
        .await
        .map_err(into_action)?;
    debug!(key = %candidate.key, %label, remote_id = ?ack.id, "sent");

    let record = Record::new(candidate.key.clone()).with_remote_id(ack.id.clone());
    if let Err(err) = ctx.ledger().put(&record).await {
        warn!(key = %candidate.key, error = ?err, "could not record delivery; the item will be sent again next run");
    }

    Ok(Sent {
        path: entry.path.clone(),
        label,
        remote_id: ack.id,
    })
}
