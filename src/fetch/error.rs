//! Fetch error types
//!
//! Defines every way a metric fetch can end without data.

use thiserror::Error;

/// Errors that can occur while fetching a metric series
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// A page came back with a non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Request exceeded the client timeout
    #[error("Request timeout")]
    Timeout,

    /// Backend could not be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Response body was not JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The `next` chain did not terminate within the page limit
    #[error("Pagination exceeded {0} pages")]
    TooManyPages(usize),

    /// Request was superseded or its panel unmounted
    #[error("Request aborted")]
    Aborted,
}

impl FetchError {
    /// Whether this is a cancellation rather than a failure
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Unavailable
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<futures_util::future::Aborted> for FetchError {
    fn from(_: futures_util::future::Aborted) -> Self {
        FetchError::Aborted
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FetchError::Status {
            status: 500,
            url: "https://api.example.com/api/Steps/?page=2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 500 from https://api.example.com/api/Steps/?page=2"
        );
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_abort());
    }

    #[test]
    fn test_abort_conversion() {
        let err: FetchError = futures_util::future::Aborted.into();
        assert!(err.is_abort());
        assert_eq!(err.status(), None);
    }
}
