use crate::path::folder_name;
use std::path::{Path, PathBuf};

/// A message file discovered in the spool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoolEntry {
    /// Path relative to the spool root.
    pub path: PathBuf,
    /// Path including the spool root.
    pub absolute: PathBuf,
    pub size: u64,
}

impl SpoolEntry {
    pub fn new(root: &Path, path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        Self {
            absolute: root.join(&path),
            path,
            size,
        }
    }

    /// The folder this entry belongs to, `.` for the spool root.
    pub fn folder(&self) -> String {
        folder_name(self.path.parent().unwrap_or(Path::new("")))
    }
}
