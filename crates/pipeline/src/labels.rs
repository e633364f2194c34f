//! Making sure every folder has a label before anything is sent.

use crate::Context;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mailport_executor::WorkItem;
use mailport_naming::{LabelTable, normalize};
use mailport_remote::{Label, into_action};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const LIST_KEY: &str = "labels.list";

/// A local folder and the label its messages go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    /// `/` separated, `.` for the spool root.
    pub folder: String,
    pub label: String,
}

/// Outcome of [`resolve_labels`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Every label the import may use, frozen for the rest of the run.
    pub table: Arc<LabelTable>,
    pub folders: Vec<FolderEntry>,
    /// Labels that had to be created, in creation order.
    pub created: Vec<String>,
}

/// Maps every spool folder to a label and creates the labels that do not
/// exist yet.
///
/// Listing and creation go through the context's executor, so they are
/// retried like any other remote call and a rejected creation fails the
/// whole phase. Names are compared case-insensitively; two folders mapping
/// to `Visas` and `visas` produce one label.
#[instrument("resolving labels", skip_all, fields(account = ctx.account()))]
pub async fn resolve_labels(ctx: &Context) -> Result<Resolution> {
    let folders = ctx
        .spool()
        .folders(ctx.rules())
        .or_raise(|| ErrorKind::Spool)?
        .into_iter()
        .map(|folder| {
            let label = ctx.mapper().map(&folder).or_raise(|| ErrorKind::Naming)?;
            Ok(FolderEntry { folder, label })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(folders = folders.len(), "mapped folders");

    let existing = list_labels(ctx).await?;
    let mut table: LabelTable = existing.into_iter().map(|label| (label.name, label.id)).collect();

    let mut seen = HashSet::new();
    let missing: Vec<String> = folders
        .iter()
        .filter(|entry| !table.contains(&entry.label))
        .filter(|entry| seen.insert(normalize(&entry.label).to_lowercase()))
        .map(|entry| entry.label.clone())
        .collect();

    let items = missing.iter().map(|name| {
        let remote = ctx.remote().clone();
        let account = ctx.account().to_string();
        let name = name.clone();
        WorkItem::new(name.clone(), move || {
            let remote = remote.clone();
            let account = account.clone();
            let name = name.clone();
            async move { remote.create_label(&account, &name).await.map_err(into_action) }
        })
    });
    let completed = ctx.executor().run(items.collect::<Vec<_>>().into_iter()).await.or_raise(|| ErrorKind::Labels)?;

    let mut created = Vec::with_capacity(completed.len());
    for done in completed {
        info!(label = %done.key, id = %done.output.id, "created label");
        table.insert(&done.key, done.output.id);
        created.push(done.key);
    }
    info!(labels = table.len(), created = created.len(), "labels resolved");

    Ok(Resolution {
        table: table.freeze(),
        folders,
        created,
    })
}

async fn list_labels(ctx: &Context) -> Result<Vec<Label>> {
    let remote = ctx.remote().clone();
    let account = ctx.account().to_string();
    let item = WorkItem::new(LIST_KEY, move || {
        let remote = remote.clone();
        let account = account.clone();
        async move { remote.list_labels(&account).await.map_err(into_action) }
    });
    let mut listed = ctx.executor().run(vec![item].into_iter()).await.or_raise(|| ErrorKind::Labels)?;
    Ok(listed.pop().map(|done| done.output).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{context, memory_store};
    use mailport_naming::{LabelMapper, Overrides};
    use mailport_remote::ErrorKind as RemoteErrorKind;
    use mailport_remote::mock::{LIST_LABELS, MockRemote};
    use mailport_spool::backend::MockSpool;

    fn spool() -> MockSpool {
        MockSpool::with_files([("1.", "a"), ("Sent/1.", "b"), ("Visas/1.", "c")])
    }

    fn mapper() -> LabelMapper {
        LabelMapper::new(Overrides::new([("sent", "inbox"), ("visas", "Visa Emails"), (".", "inbox")]).unwrap())
    }

    #[tokio::test]
    async fn test_creates_only_missing_labels() {
        let remote = Arc::new(MockRemote::new().with_labels([("INBOX", "INBOX")]));
        let ctx = context(spool(), remote.clone(), memory_store(), 2).with_mapper(mapper());

        let resolution = resolve_labels(&ctx).await.unwrap();
        assert_eq!(remote.created(), ["Visa Emails"]);
        assert_eq!(resolution.created, ["Visa Emails"]);
        assert_eq!(resolution.table.len(), 2);
        assert_eq!(resolution.table.get("inbox"), Some("INBOX"));
        assert_eq!(resolution.table.get("visa emails"), Some("Label_1"));
        let labels: Vec<_> = resolution.folders.iter().map(|f| (f.folder.as_str(), f.label.as_str())).collect();
        assert_eq!(labels, [(".", "inbox"), ("Sent", "inbox"), ("Visas", "Visa Emails")]);
    }

    #[tokio::test]
    async fn test_names_differing_in_case_are_created_once() {
        let spool = MockSpool::with_files([("Projects/1.", "a"), ("projects/1.", "b")]);
        let remote = Arc::new(MockRemote::new());
        let ctx = context(spool, remote.clone(), memory_store(), 4);

        resolve_labels(&ctx).await.unwrap();
        let created = remote.created();
        assert_eq!(created.len(), 2, "{created:?}");
        assert!(created.contains(&".".to_string()));
    }

    #[tokio::test]
    async fn test_listing_is_retried() {
        let remote = Arc::new(
            MockRemote::new()
                .with_labels([("INBOX", "INBOX")])
                .failing(LIST_LABELS, [RemoteErrorKind::Network]),
        );
        let ctx = context(spool(), remote.clone(), memory_store(), 1).with_mapper(mapper());
        let resolution = resolve_labels(&ctx).await.unwrap();
        assert_eq!(resolution.table.get("INBOX"), Some("INBOX"));
    }

    #[tokio::test]
    async fn test_rejected_creation_fails_the_phase() {
        let remote = Arc::new(MockRemote::new().failing("Visa Emails", [RemoteErrorKind::BadRequest("Invalid label name".into())]));
        let ctx = context(spool(), remote.clone(), memory_store(), 1).with_mapper(mapper());
        let err = resolve_labels(&ctx).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Labels));
    }
}
