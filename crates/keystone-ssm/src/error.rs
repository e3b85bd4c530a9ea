//! Error types for parameter store access.

use thiserror::Error;

/// Errors returned by a [`ParamStore`](crate::ParamStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The HTTP request could not be sent or its body read.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Parameter store returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request or response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured header name or value is invalid.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Any other store failure.
    #[error("Parameter store error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Create a new backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a new invalid header error.
    pub fn invalid_header(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::backend("throttled");
        assert_eq!(err.to_string(), "Parameter store error: throttled");

        let err = StoreError::Status {
            status: 400,
            body: "ValidationException".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("ValidationException"));

        let err = StoreError::invalid_header("x-token", "invalid value");
        assert_eq!(err.to_string(), "Invalid header x-token: invalid value");
    }
}
