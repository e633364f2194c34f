//! Executor Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Two layers exist: [`FailureCode`] is what an *action* reports when it
//! fails (the remote's verdict), and [`ErrorKind`] is what the *executor*
//! reports when a failure escapes the retry loop and ends the run.

use derive_more::{Display, Error};

/// An executor error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for executor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error returned by a failed action invocation.
pub type ActionError = exn::Exn<FailureCode>;
/// Result type alias for a single action invocation.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Discriminator attached to every action failure.
///
/// The [`RetryPolicy`](crate::RetryPolicy) decides what happens next based
/// solely on this code; the rest of the error tree is carried along for the
/// operator's benefit.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCode {
    /// Credentials or session expired.
    #[display("unauthorized")]
    Unauthorized,
    /// The remote end asked us to slow down.
    #[display("rate limited")]
    RateLimited,
    /// The request itself is malformed. Waiting will never fix it.
    #[display("bad request")]
    BadRequest,
    /// Anything else; assumed to be transient.
    #[display("unknown failure")]
    Unknown,
}

impl FailureCode {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::BadRequest)
    }
}

/// Reasons a run is stopped.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An action failed with [`FailureCode::BadRequest`].
    #[display("action `{key}` was rejected as malformed")]
    Rejected { key: String },
    /// An action kept failing until the retry ceiling was reached.
    #[display("action `{key}` still failing after {attempts} attempts")]
    RetriesExhausted { key: String, attempts: u32 },
    /// Concurrency must allow at least one action in flight.
    #[display("invalid concurrency limit: {_0}")]
    InvalidConcurrency(#[error(not(source))] usize),
}

impl ErrorKind {
    /// The key of the action that stopped the run, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Rejected { key } | Self::RetriesExhausted { key, .. } => Some(key),
            Self::InvalidConcurrency(_) => None,
        }
    }
}
