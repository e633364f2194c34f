//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source could not be read or did not match the expected shape.
    #[display("could not load configuration")]
    Load,
    #[display("configuration file not found: {}", _0.display())]
    Missing(#[error(not(source))] PathBuf),
    #[display("unsupported configuration format (expected .toml, .yaml, .yml or .json): {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    #[display("invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
    /// The operating system reports no home directory for the current user.
    #[display("could not determine per-user directories")]
    NoHomeDirectory,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
