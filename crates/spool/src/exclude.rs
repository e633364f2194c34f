use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Why an entry is left out of an import.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Excluded {
    #[display("inside ignored directory `{_0}`")]
    Directory(String),
    #[display("file name matches ignored pattern `{_0}`")]
    Filename(String),
    #[display("{size} bytes exceeds the {limit} byte limit")]
    Oversized { size: u64, limit: u64 },
}

/// Rules deciding which spool entries are never imported.
///
/// - A directory is ignored when any component of its path is *exactly*
///   one of the ignored names (case-sensitive); everything beneath it goes too.
/// - A file is ignored when any pattern matches anywhere in its name.
/// - A file larger than the size ceiling is ignored for this run.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    dirs: BTreeSet<String>,
    files: Vec<Regex>,
    max_size: Option<u64>,
}

impl Exclusions {
    pub fn new<D, F>(dirs: D, files: F, max_size: Option<u64>) -> Result<Self>
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let files = files
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).or_raise(|| ErrorKind::InvalidPattern(pattern.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            files,
            max_size,
        })
    }

    /// Stop ignoring a directory name (`--include-trash`, `--include-drafts`).
    pub fn without_dir(mut self, name: &str) -> Self {
        self.dirs.remove(name);
        self
    }

    /// Checks a directory path relative to the spool root.
    pub fn check_dir(&self, relative: &Path) -> Option<Excluded> {
        relative.components().find_map(|component| match component {
            Component::Normal(name) => {
                let name = name.to_str()?;
                self.dirs.contains(name).then(|| Excluded::Directory(name.to_string()))
            },
            _ => None,
        })
    }

    /// Checks a file path relative to the spool root.
    pub fn check_file(&self, relative: &Path, size: u64) -> Option<Excluded> {
        if let Some(parent) = relative.parent()
            && let Some(excluded) = self.check_dir(parent)
        {
            return Some(excluded);
        }
        if let Some(name) = relative.file_name() {
            let name = name.to_string_lossy();
            if let Some(pattern) = self.files.iter().find(|pattern| pattern.is_match(&name)) {
                return Some(Excluded::Filename(pattern.as_str().to_string()));
            }
        }
        match self.max_size {
            Some(limit) if size > limit => Some(Excluded::Oversized { size, limit }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rules() -> Exclusions {
        Exclusions::new(
            ["servers", "Trash", "Drafts"],
            ["cyrus.index", "cyrus.cache", "cyrus.header", "cyrus.squat"],
            Some(1024),
        )
        .unwrap()
    }

    #[rstest]
    #[case("Trash", Some("Trash"))]
    #[case("Archive/Trash/2019", Some("Trash"))]
    #[case("trash", None)]
    #[case("Trashcan", None)]
    #[case("Archive", None)]
    fn test_directory_components(rules: Exclusions, #[case] dir: &str, #[case] expected: Option<&str>) {
        assert_eq!(rules.check_dir(Path::new(dir)), expected.map(|d| Excluded::Directory(d.to_string())));
    }

    #[rstest]
    #[case("INBOX/cyrus.index", Some(Excluded::Filename("cyrus.index".to_string())))]
    #[case("old.cyrus.squat.bak", Some(Excluded::Filename("cyrus.squat".to_string())))]
    #[case("Drafts/1.", Some(Excluded::Directory("Drafts".to_string())))]
    #[case("INBOX/1.", None)]
    fn test_files(rules: Exclusions, #[case] file: &str, #[case] expected: Option<Excluded>) {
        assert_eq!(rules.check_file(Path::new(file), 10), expected);
    }

    #[rstest]
    fn test_oversized(rules: Exclusions) {
        assert_eq!(rules.check_file(Path::new("INBOX/1."), 1024), None);
        assert_eq!(
            rules.check_file(Path::new("INBOX/2."), 1025),
            Some(Excluded::Oversized { size: 1025, limit: 1024 })
        );
    }

    #[rstest]
    fn test_without_dir(rules: Exclusions) {
        let rules = rules.without_dir("Trash");
        assert_eq!(rules.check_dir(Path::new("Trash")), None);
        assert!(rules.check_dir(Path::new("Drafts")).is_some());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Exclusions::new(Vec::<String>::new(), ["cyrus.("], None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPattern(p) if p == "cyrus.("));
    }
}
