//! Client-side error taxonomy for calls against the task service.
//!
//! Every remote call is a single round trip; whatever goes wrong is captured
//! here and propagated verbatim to the caller, which decides how to present
//! it. There is no retry and no automatic recovery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, DNS, timeout) or the
    /// response body could not be read/decoded.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The stored session token cannot be used as an `Authorization` header.
    #[error("session token is not a valid authorization header value")]
    InvalidToken,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server rejected the call for lack of (valid) credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_expose_the_code() {
        let err = ApiError::Status {
            status: 401,
            message: "invalid credentials".to_string(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(
            err.to_string(),
            "server returned 401: invalid credentials"
        );
    }

    #[test]
    fn non_status_errors_are_not_unauthorized() {
        assert!(!ApiError::InvalidToken.is_unauthorized());
        assert_eq!(ApiError::InvalidToken.status(), None);
    }
}
