//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the other crates end up
//! as children of these.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not obtain credentials")]
    Authorization,
    #[display("could not read the spool")]
    Spool,
    /// Walking the spool failed part way; the import stops.
    #[display("spool traversal failed")]
    Discovery,
    #[display("could not derive the ledger key for an item")]
    Key,
    #[display("folder could not be mapped to a label")]
    Naming,
    #[display("label resolution failed")]
    Labels,
    #[display("no label found for `{_0}`")]
    MissingLabel(#[error(not(source))] String),
    #[display("import failed")]
    Import,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Anything that reaches this level has already been through the
    /// executor's retries.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
