//! Spool trait and implementations.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalSpool;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockSpool;
use crate::Exclusions;
use crate::error::Result;
use crate::models::SpoolEntry;
use async_trait::async_trait;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<SpoolEntry>> + Send + 'a>>;

/// Read access to a mail spool.
///
/// Folder names are relative to the spool root, use `/` as separator and
/// spell the root itself `.`.
#[async_trait]
pub trait Spool: Send + Sync {
    /// Human-readable identity, used in logs.
    fn name(&self) -> &str;

    /// Every folder not excluded by `rules`, root first, the rest sorted.
    ///
    /// Runs synchronously: it happens once, before any upload starts.
    fn folders(&self, rules: &Exclusions) -> Result<Vec<String>>;

    /// Lazily discovers every message not excluded by `rules`.
    ///
    /// Entries dropped for their size are logged at `warn`. Any traversal
    /// error is yielded; callers decide whether to carry on.
    fn entries<'a>(&'a self, rules: &'a Exclusions) -> EntryStream<'a>;

    /// Reads the payload of an entry, by path relative to the root.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}
