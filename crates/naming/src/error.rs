//! Naming Error Types

use derive_more::{Display, Error};

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Mapping and normalizing the folder left nothing to name a label with.
    #[display("folder `{_0}` maps to an empty label name")]
    EmptyName(#[error(not(source))] String),
    /// The same folder name (ignoring case) has two different targets.
    #[display("conflicting overrides for folder `{key}`")]
    ConflictingOverride { key: String },
    /// A target is itself a folder name that maps somewhere else, so mapping
    /// twice would not give the same label as mapping once.
    #[display("override target `{target}` is itself overridden (by `{key}`)")]
    ChainedOverride { key: String, target: String },
    #[display("invalid subfolder label: `{_0}`")]
    InvalidSubfolder(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
