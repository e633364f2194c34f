//! Spool on the local filesystem.

use crate::backend::EntryStream;
use crate::error::{ErrorKind, Result};
use crate::path::{ROOT_FOLDER, folder_name, validate as validate_path};
use crate::{Excluded, Exclusions, Spool, SpoolEntry};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};
use tracing::{trace, warn};

enum WalkEntry {
    File(SpoolEntry),
    Descend(PathBuf),
    Skip,
}

/// A spool directory on the local filesystem.
///
/// Symbolic links are neither followed nor imported.
#[derive(Debug, Clone)]
pub struct LocalSpool {
    name: String,
    root: PathBuf,
}

impl LocalSpool {
    /// `root` must be an absolute path to an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self {
            name: root.display().to_string(),
            root,
        })
    }

    fn relative_path(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute
            .strip_prefix(&self.root)
            .or_raise(|| ErrorKind::InvalidPath(absolute.to_path_buf()))?;
        validate_path(relative)
    }

    fn classify(&self, path: &Path, metadata: &Metadata, rules: &Exclusions) -> Result<WalkEntry> {
        let relative = self.relative_path(path)?;
        if metadata.is_dir() {
            if let Some(reason) = rules.check_dir(&relative) {
                trace!(path = %relative.display(), %reason, "skipping directory");
                return Ok(WalkEntry::Skip);
            }
            return Ok(WalkEntry::Descend(path.to_path_buf()));
        }
        if !metadata.is_file() {
            return Ok(WalkEntry::Skip);
        }
        match rules.check_file(&relative, metadata.len()) {
            None => Ok(WalkEntry::File(SpoolEntry::new(&self.root, relative, metadata.len()))),
            Some(reason @ Excluded::Oversized { .. }) => {
                warn!(path = %relative.display(), %reason, "permanently excluding oversized item for this run");
                Ok(WalkEntry::Skip)
            },
            Some(reason) => {
                trace!(path = %relative.display(), %reason, "skipping file");
                Ok(WalkEntry::Skip)
            },
        }
    }

    async fn process_entry(&self, entry: DirEntry, rules: &Exclusions) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| ErrorKind::from_io(e, &path))?;
        self.classify(&path, &metadata, rules)
    }
}

#[async_trait]
impl Spool for LocalSpool {
    fn name(&self) -> &str {
        &self.name
    }

    fn folders(&self, rules: &Exclusions) -> Result<Vec<String>> {
        let mut folders = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(current) = stack.pop() {
            let entries = std::fs::read_dir(&current).map_err(|e| ErrorKind::from_io(e, &current))?;
            for entry in entries {
                let entry = entry.map_err(|e| ErrorKind::from_io(e, &current))?;
                let path = entry.path();
                let metadata = entry.metadata().map_err(|e| ErrorKind::from_io(e, &path))?;
                if !metadata.is_dir() {
                    continue;
                }
                let relative = self.relative_path(&path)?;
                if rules.check_dir(&relative).is_none() {
                    folders.push(folder_name(&relative));
                    stack.push(path);
                }
            }
        }
        folders.sort();
        folders.insert(0, ROOT_FOLDER.to_string());
        Ok(folders)
    }

    fn entries<'a>(&'a self, rules: &'a Exclusions) -> EntryStream<'a> {
        let mut stack = vec![self.root.clone()];
        Box::pin(stream! {
            while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    Err(err) => {
                        yield Err(exn::Exn::from(ErrorKind::from_io(err, &current)));
                        continue;
                    }
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(err) => {
                            yield Err(exn::Exn::from(ErrorKind::from_io(err, &current)));
                            break;
                        },
                    };
                    match self.process_entry(entry, rules).await {
                        Ok(WalkEntry::File(file)) => yield Ok(file),
                        Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                        Ok(WalkEntry::Skip) => {},
                        Err(err) => yield Err(err),
                    }
                }
            }
        })
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let absolute = self.root.join(validate_path(path)?);
        Ok(fs::read(&absolute).await.map_err(|e| ErrorKind::from_io(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use rstest::{fixture, rstest};
    use std::fs::{create_dir_all, write};
    use tempfile::TempDir;

    #[fixture]
    fn spool() -> TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        for dir in ["Sent", "Visas", "Archive/2020", "Trash", "Drafts", "Archive/Trash"] {
            create_dir_all(root.join(dir)).unwrap();
        }
        write(root.join("1."), "Subject: one\r\n\r\n").unwrap();
        write(root.join("cyrus.index"), "index").unwrap();
        write(root.join("Sent/1."), "Subject: sent\r\n\r\n").unwrap();
        write(root.join("Visas/1."), "Subject: visa\r\n\r\n").unwrap();
        write(root.join("Archive/2020/1."), "Subject: archive\r\n\r\n").unwrap();
        write(root.join("Archive/2020/2."), vec![b'x'; 4096]).unwrap();
        write(root.join("Trash/1."), "Subject: gone\r\n\r\n").unwrap();
        write(root.join("Archive/Trash/1."), "Subject: gone\r\n\r\n").unwrap();
        tmp
    }

    fn rules() -> Exclusions {
        Exclusions::new(["Trash", "Drafts"], ["cyrus.index"], Some(1024)).unwrap()
    }

    #[test]
    fn test_relative_root_is_rejected() {
        let err = LocalSpool::new("relative/spool").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    fn test_folders(spool: TempDir) {
        let local = LocalSpool::new(spool.path()).unwrap();
        let folders = local.folders(&rules()).unwrap();
        assert_eq!(folders, [".", "Archive", "Archive/2020", "Sent", "Visas"]);
    }

    #[rstest]
    fn test_folders_with_trash_included(spool: TempDir) {
        let local = LocalSpool::new(spool.path()).unwrap();
        let folders = local.folders(&rules().without_dir("Trash")).unwrap();
        assert!(folders.contains(&"Trash".to_string()));
        assert!(folders.contains(&"Archive/Trash".to_string()));
        assert!(!folders.contains(&"Drafts".to_string()));
    }

    #[rstest]
    #[tokio::test]
    async fn test_entries(spool: TempDir) {
        let local = LocalSpool::new(spool.path()).unwrap();
        let rules = rules();
        let mut found: Vec<_> = local.entries(&rules).try_collect::<Vec<_>>().await.unwrap();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        let paths: Vec<_> = found.iter().map(|e| e.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, ["1.", "Archive/2020/1.", "Sent/1.", "Visas/1."]);
        assert_eq!(found[2].folder(), "Sent");
        assert_eq!(found[2].absolute, spool.path().join("Sent/1."));
    }

    #[rstest]
    #[tokio::test]
    async fn test_read(spool: TempDir) {
        let local = LocalSpool::new(spool.path()).unwrap();
        assert_eq!(local.read(Path::new("Sent/1.")).await.unwrap(), b"Subject: sent\r\n\r\n");
        let err = local.read(Path::new("Sent/99.")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = local.read(Path::new("../escape")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }
}
