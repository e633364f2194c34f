use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an item's identity is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Absolute path on disk. Renaming or moving a file makes it new again.
    #[default]
    Path,
    /// BLAKE3 hash of the payload. Requires reading the file before the
    /// ledger can be consulted.
    Content,
}

/// Key for an item identified by its absolute path.
///
/// Bytes that are not UTF-8 are written as `\xNN`, so distinct paths keep
/// distinct keys.
#[cfg(unix)]
pub fn key_for_path(path: impl AsRef<Path>) -> String {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    let bytes = path.as_ref().as_os_str().as_bytes();
    let mut key = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        key.push_str(chunk.valid());
        for byte in chunk.invalid() {
            _ = write!(key, "\\x{byte:02x}");
        }
    }
    key
}

/// Key for an item identified by its absolute path.
#[cfg(not(unix))]
pub fn key_for_path(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().into_owned()
}

/// Key for an item identified by its payload.
pub fn key_for_content(bytes: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(bytes))
}
