//! In-memory spool for testing.

use crate::backend::EntryStream;
use crate::error::{ErrorKind, Result};
use crate::path::{ROOT_FOLDER, folder_name, validate as validate_path};
use crate::{Excluded, Exclusions, Spool, SpoolEntry};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;

/// In-memory spool for testing.
///
/// Files are listed in path order. A per-entry delay simulates a slow walk,
/// and a walk error can be injected after a number of entries. Entries are
/// rooted at `/mock`.
pub struct MockSpool {
    name: String,
    root: PathBuf,
    files: BTreeMap<PathBuf, Vec<u8>>,
    folders: BTreeSet<PathBuf>,
    delay: Option<Duration>,
    fail_after: Option<usize>,
    reads: AtomicUsize,
}

impl MockSpool {
    /// Panics on an invalid path: test setup is wrong.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        let mut folders = BTreeSet::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockSpool::with_files: invalid path {}", path.display());
            };
            let mut parent = validated.parent();
            while let Some(dir) = parent.filter(|p| !p.as_os_str().is_empty()) {
                folders.insert(dir.to_path_buf());
                parent = dir.parent();
            }
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            root: PathBuf::from("/mock"),
            files: map,
            folders,
            delay: None,
            fail_after: None,
            reads: AtomicUsize::new(0),
        }
    }

    /// Adds a folder that contains no messages.
    pub fn with_folder(mut self, folder: impl AsRef<Path>) -> Self {
        if let Ok(validated) = validate_path(folder) {
            self.folders.insert(validated);
        }
        self
    }

    /// Sleep before yielding each entry.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Yield a walk error once `count` entries have been produced.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Number of payload reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Default for MockSpool {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl Spool for MockSpool {
    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self, rules: &Exclusions) -> Result<Vec<String>> {
        let mut folders: Vec<_> = self
            .folders
            .iter()
            .filter(|dir| rules.check_dir(dir).is_none())
            .map(|dir| folder_name(dir))
            .collect();
        folders.sort();
        folders.insert(0, ROOT_FOLDER.to_string());
        Ok(folders)
    }

    fn entries<'a>(&'a self, rules: &'a Exclusions) -> EntryStream<'a> {
        Box::pin(stream! {
            for (produced, (path, data)) in self.files.iter().enumerate() {
                if self.fail_after == Some(produced) {
                    yield Err(exn::Exn::from(ErrorKind::PermissionDenied(self.root.join(path))));
                    return;
                }
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                let size = data.len() as u64;
                match rules.check_file(path, size) {
                    None => yield Ok(SpoolEntry::new(&self.root, path.clone(), size)),
                    Some(reason @ Excluded::Oversized { .. }) => {
                        warn!(path = %path.display(), %reason, "permanently excluding oversized item for this run");
                    },
                    Some(_) => {},
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }
}
