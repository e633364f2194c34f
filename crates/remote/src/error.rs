//! Remote Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use mailport_executor::{ActionError, FailureCode};

/// A remote error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials are missing, expired or revoked.
    #[display("unauthorized")]
    Unauthorized,
    /// Quota exceeded; slow down.
    #[display("rate limited")]
    RateLimited,
    /// The remote refused the request as invalid. Sending it again won't help.
    #[display("bad request: {_0}")]
    BadRequest(#[error(not(source))] String),
    #[display("network error")]
    Network,
    #[display("unexpected response status {status}")]
    Unexpected { status: u16 },
    /// The credential provider failed.
    #[display("could not obtain credentials")]
    Authorization,
    #[display("invalid response data")]
    InvalidData,
}

impl ErrorKind {
    /// How the executor should treat this failure.
    pub fn code(&self) -> FailureCode {
        match self {
            Self::Unauthorized => FailureCode::Unauthorized,
            Self::RateLimited => FailureCode::RateLimited,
            Self::BadRequest(_) => FailureCode::BadRequest,
            Self::Network | Self::Unexpected { .. } | Self::Authorization | Self::InvalidData => FailureCode::Unknown,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

/// Wraps a remote error for the executor, keeping the remote error tree as
/// the child of its [`FailureCode`].
#[track_caller]
pub fn into_action(err: Error) -> ActionError {
    let code = err.code();
    err.raise(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Unauthorized, FailureCode::Unauthorized)]
    #[case(ErrorKind::RateLimited, FailureCode::RateLimited)]
    #[case(ErrorKind::BadRequest("Invalid label name".to_string()), FailureCode::BadRequest)]
    #[case(ErrorKind::Network, FailureCode::Unknown)]
    #[case(ErrorKind::Unexpected { status: 503 }, FailureCode::Unknown)]
    fn test_failure_codes(#[case] kind: ErrorKind, #[case] expected: FailureCode) {
        assert_eq!(kind.code(), expected);
        let action = into_action(exn::Exn::from(kind));
        assert_eq!(*action, expected);
    }
}
