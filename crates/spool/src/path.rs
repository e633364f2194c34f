//! Relative spool paths.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Name of the spool root when spelled as a folder.
pub const ROOT_FOLDER: &str = ".";

/// Normalizes a path relative to the spool root.
///
/// `.` components and repeated separators are dropped and `..` is resolved,
/// but a path that would leave the root, is empty, absolute on a foreign
/// prefix, or contains a null byte is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// ```
/// use std::path::Path;
/// use mailport_spool::validate_path;
/// assert_eq!(validate_path("INBOX/./Archive//12.").unwrap(), Path::new("INBOX/Archive/12."));
/// assert!(validate_path("../other-user/INBOX/1.").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive `Path::components()` on Unix but truncate
                // paths handed to the OS.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    }
    Ok(components.into_iter().collect())
}

/// Folder name of a directory relative to the spool root: components joined
/// with `/`, or [`ROOT_FOLDER`] for the root itself.
pub fn folder_name(relative_dir: &Path) -> String {
    let parts: Vec<_> = relative_dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return ROOT_FOLDER.to_string();
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("INBOX/1.", "INBOX/1.")]
    #[case("a//b/./c", "a/b/c")]
    #[case("a/b/..", "a")]
    #[case("Sent/", "Sent")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("")]
    #[case("./.")]
    #[case("a\0b")]
    fn test_invalid_paths(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[rstest]
    #[case("", ".")]
    #[case(".", ".")]
    #[case("Sent", "Sent")]
    #[case("Archive/2020/Q1", "Archive/2020/Q1")]
    fn test_folder_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(folder_name(Path::new(input)), expected);
    }
}
