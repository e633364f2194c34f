use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::import::{Sent, work_item};
use crate::labels::{Resolution, resolve_labels};
use crate::progress::Progress;
use crate::source::WorkSource;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use mailport_executor::{Completed, Pull, Source};
use mailport_naming::LabelTable;
use mailport_remote::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Progress events emitted by [`Migration::run`].
///
/// Events follow a strict ordering:
/// 1. [`Authorized`](Self::Authorized), once, when a session is attached.
/// 2. [`LabelsResolved`](Self::LabelsResolved), once.
/// 3. [`Imported`](Self::Imported), once per delivered item.
/// 4. [`Complete`](Self::Complete), once, signalling the stream is finished.
///
/// An error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum MigrationEvent {
    Authorized,
    LabelsResolved(Resolution),
    Imported { sent: Completed<Sent>, progress: Progress },
    Complete(Summary),
}

/// Totals for a finished import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub migrated: u64,
    /// Entries already in the ledger from an earlier run.
    pub skipped: u64,
    pub elapsed: Duration,
}

/// Authorizes, resolves labels, then imports the spool.
pub struct Migration {
    ctx: Arc<Context>,
    session: Option<Arc<Session>>,
}

impl Migration {
    pub fn new(ctx: impl Into<Arc<Context>>) -> Self {
        Self {
            ctx: ctx.into(),
            session: None,
        }
    }

    /// Authorize this session before touching the remote.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Streams [`MigrationEvent`]s until the import finishes or fails.
    ///
    /// No label is created once the first item is sent. Dropping the stream
    /// stops the spool walk and cancels in-flight sends.
    pub fn run(&self) -> impl Stream<Item = Result<MigrationEvent>> + '_ {
        stream!({
            if let Some(session) = &self.session {
                match session.authorize().await.or_raise(|| ErrorKind::Authorization) {
                    Ok(()) => yield Ok(MigrationEvent::Authorized),
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                }
            }

            let resolution = match resolve_labels(&self.ctx).await {
                Ok(resolution) => resolution,
                Err(err) => {
                    yield Err(err);
                    return;
                },
            };
            let table = resolution.table.clone();
            yield Ok(MigrationEvent::LabelsResolved(resolution));

            let started = Instant::now();
            let source = WorkSource::spawn(self.ctx.clone());
            let queue = ImportQueue {
                source: &source,
                ctx: self.ctx.clone(),
                table,
            };
            let mut migrated = 0;
            for await result in self.ctx.executor().stream(queue) {
                match result.or_raise(|| ErrorKind::Import) {
                    Ok(sent) => {
                        migrated += 1;
                        let progress = Progress {
                            migrated,
                            total: source.queued(),
                            elapsed: started.elapsed(),
                        };
                        info!("{progress}");
                        yield Ok(MigrationEvent::Imported { sent, progress });
                    },
                    Err(err) => {
                        yield Err(err);
                        return;
                    },
                }
            }
            if let Some(err) = source.take_failure() {
                yield Err(err);
                return;
            }

            let summary = Summary {
                migrated,
                skipped: source.skipped(),
                elapsed: started.elapsed(),
            };
            info!(migrated, skipped = summary.skipped, "import complete");
            yield Ok(MigrationEvent::Complete(summary));
        })
    }
}

struct ImportQueue<'a> {
    source: &'a WorkSource,
    ctx: Arc<Context>,
    table: Arc<LabelTable>,
}

impl Source<Sent> for ImportQueue<'_> {
    fn pull(&mut self) -> Pull<Sent> {
        self.source.next(|candidate| work_item(self.ctx.clone(), self.table.clone(), candidate))
    }
}
