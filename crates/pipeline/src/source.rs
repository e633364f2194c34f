//! The import work queue.
//!
//! A producer task walks the spool and, for every entry, asks the ledger
//! whether it was already delivered. Lookups run concurrently with the walk
//! (up to the context's lookup limit) so a slow ledger never holds up
//! discovery. Fresh entries land in a shared queue that the executor drains
//! while it is still being filled.

use crate::Context;
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use mailport_executor::{Pull, WorkItem};
use mailport_ledger::{KeyStrategy, key_for_content, key_for_path};
use mailport_spool::SpoolEntry;
use mailport_spool::error::Result as SpoolResult;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// A spool entry that still has to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub key: String,
    pub entry: SpoolEntry,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<VecDeque<Candidate>>,
    failure: Mutex<Option<Error>>,
    done: AtomicBool,
    failed: AtomicBool,
    queued: AtomicU64,
    skipped: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live queue of entries not yet delivered.
///
/// Dropping it stops the producer.
pub struct WorkSource {
    shared: Arc<Shared>,
    producer: JoinHandle<()>,
}

impl WorkSource {
    /// Starts walking the spool in a background task.
    pub fn spawn(ctx: Arc<Context>) -> Self {
        let shared = Arc::new(Shared::default());
        let producer = tokio::spawn(produce(ctx, shared.clone()));
        Self { shared, producer }
    }

    /// Takes the next candidate, turning it into a work item with `build`.
    ///
    /// Reports [`Pull::Starved`] while the walk is still running and the
    /// queue is momentarily empty, and [`Pull::Exhausted`] once the walk has
    /// finished and everything was handed out, or as soon as the walk failed.
    pub fn next<T>(&self, build: impl FnOnce(Candidate) -> WorkItem<T>) -> Pull<T> {
        if self.shared.failed.load(Ordering::Acquire) {
            return Pull::Exhausted;
        }
        // Read before popping: an empty queue after `done` is final.
        let done = self.shared.done.load(Ordering::Acquire);
        let next = lock(&self.shared.queue).pop_front();
        match next {
            Some(candidate) => Pull::Item(build(candidate)),
            None if done => Pull::Exhausted,
            None => Pull::Starved,
        }
    }

    /// Entries queued for sending so far.
    pub fn queued(&self) -> u64 {
        self.shared.queued.load(Ordering::Relaxed)
    }

    /// Entries skipped because the ledger already had them.
    pub fn skipped(&self) -> u64 {
        self.shared.skipped.load(Ordering::Relaxed)
    }

    pub fn is_done(&self) -> bool {
        self.shared.done.load(Ordering::Acquire)
    }

    /// The error that stopped the walk, if any. Returned only once.
    pub fn take_failure(&self) -> Option<Error> {
        lock(&self.shared.failure).take()
    }
}

impl Drop for WorkSource {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

#[instrument("walking spool", skip_all, fields(spool = ctx.spool().name()))]
async fn produce(ctx: Arc<Context>, shared: Arc<Shared>) {
    let mut lookups = ctx
        .spool()
        .entries(ctx.rules())
        .map(|entry| lookup(&ctx, entry))
        .buffer_unordered(ctx.lookup_concurrency());

    while let Some(result) = lookups.next().await {
        match result {
            Ok(Some(candidate)) => {
                trace!(key = %candidate.key, "queued");
                lock(&shared.queue).push_back(candidate);
                shared.queued.fetch_add(1, Ordering::Relaxed);
            },
            Ok(None) => {
                shared.skipped.fetch_add(1, Ordering::Relaxed);
            },
            Err(err) => {
                warn!(error = ?err, "stopping import: spool walk failed");
                *lock(&shared.failure) = Some(err);
                shared.failed.store(true, Ordering::Release);
                return;
            },
        }
    }

    let queued = shared.queued.load(Ordering::Relaxed);
    let skipped = shared.skipped.load(Ordering::Relaxed);
    info!(queued, skipped, "spool walk complete");
    shared.done.store(true, Ordering::Release);
}

async fn lookup(ctx: &Context, entry: SpoolResult<SpoolEntry>) -> Result<Option<Candidate>> {
    let entry = entry.or_raise(|| ErrorKind::Discovery)?;
    let key = item_key(ctx, &entry).await?;
    match ctx.ledger().contains(&key).await {
        Ok(true) => {
            debug!(%key, "already imported");
            Ok(None)
        },
        Ok(false) => Ok(Some(Candidate { key, entry })),
        Err(err) => {
            warn!(%key, error = ?err, "ledger lookup failed, sending anyway");
            Ok(Some(Candidate { key, entry }))
        },
    }
}

async fn item_key(ctx: &Context, entry: &SpoolEntry) -> Result<String> {
    match ctx.keys() {
        KeyStrategy::Path => Ok(key_for_path(&entry.absolute)),
        KeyStrategy::Content => {
            let payload = ctx.spool().read(&entry.path).await.or_raise(|| ErrorKind::Key)?;
            Ok(key_for_content(&payload))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{context, drain, memory_store};
    use mailport_ledger::{DedupStore, Record};
    use mailport_remote::mock::MockRemote;
    use mailport_spool::backend::MockSpool;
    use std::time::Duration;

    fn keys_of(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_ledger_entries_are_skipped() {
        let ledger = memory_store();
        ledger.put(&Record::new("/mock/INBOX/2.")).await.unwrap();
        let spool = MockSpool::with_files([("INBOX/1.", "a"), ("INBOX/2.", "b"), ("INBOX/3.", "c")]);
        let ctx = context(spool, Arc::new(MockRemote::new()), ledger, 2).shared();

        let source = WorkSource::spawn(ctx);
        let mut candidates = drain(&source).await;
        candidates.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(keys_of(&candidates), ["/mock/INBOX/1.", "/mock/INBOX/3."]);
        assert_eq!(source.queued(), 2);
        assert_eq!(source.skipped(), 1);
        assert!(source.take_failure().is_none());
    }

    #[tokio::test]
    async fn test_content_keys() {
        let ledger = memory_store();
        ledger.put(&Record::new(key_for_content(b"seen before"))).await.unwrap();
        let spool = MockSpool::with_files([("Moved/7.", "seen before"), ("INBOX/1.", "new")]);
        let ctx = context(spool, Arc::new(MockRemote::new()), ledger, 1).with_keys(KeyStrategy::Content).shared();

        let source = WorkSource::spawn(ctx);
        let candidates = drain(&source).await;
        assert_eq!(keys_of(&candidates), [key_for_content(b"new")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_starved_until_walk_finishes() {
        let spool = MockSpool::with_files([("1.", "a")]).with_delay(Duration::from_secs(1));
        let ctx = context(spool, Arc::new(MockRemote::new()), memory_store(), 1).shared();
        let source = WorkSource::spawn(ctx);

        let first = source.next(|c| WorkItem::new(c.key, || async { Ok(()) }));
        assert!(matches!(first, Pull::Starved));
        let candidates = drain(&source).await;
        assert_eq!(candidates.len(), 1);
        assert!(source.is_done());
    }

    #[tokio::test]
    async fn test_walk_failure_exhausts_the_queue() {
        let spool = MockSpool::with_files([("1.", "a"), ("2.", "b"), ("3.", "c")]).failing_after(1);
        let ctx = context(spool, Arc::new(MockRemote::new()), memory_store(), 1).shared();
        let source = WorkSource::spawn(ctx);

        drain(&source).await;
        let err = source.take_failure().unwrap();
        assert!(matches!(&*err, ErrorKind::Discovery));
        assert!(!source.is_done());
    }
}
