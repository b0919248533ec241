// crates/network/src/error.rs
//! Error types for network operations

use guidesync_core::{ClassifiedError, ErrorClass, RemoteError};
use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while setting up or using a service client
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API key cannot be sent as a header value
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    /// Returns true if the request may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Http(e) => !e.is_builder() && !e.is_decode(),
            NetworkError::Status { .. } => self.is_server_error(),
            _ => false,
        }
    }

    /// Returns true if the error is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if *status >= 500)
    }
}

impl ClassifiedError for NetworkError {
    fn class(&self) -> ErrorClass {
        match self {
            NetworkError::InvalidUrl(_) | NetworkError::InvalidApiKey => ErrorClass::Configuration,
            _ => ErrorClass::RemoteCall,
        }
    }
}

impl From<NetworkError> for RemoteError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Status { status, message } => RemoteError::Status { status, message },
            NetworkError::InvalidResponse(reason) => RemoteError::InvalidResponse(reason),
            other => RemoteError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NetworkError::InvalidUrl("test".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_status_classification() {
        let not_found = NetworkError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!not_found.is_server_error());
        assert!(!not_found.is_retryable());

        let unavailable = NetworkError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert!(unavailable.is_server_error());
        assert!(unavailable.is_retryable());
    }

    #[test]
    fn test_configuration_errors() {
        assert_eq!(NetworkError::InvalidApiKey.class(), ErrorClass::Configuration);
        assert!(!NetworkError::InvalidUrl("x".to_string()).is_retryable());
    }

    #[test]
    fn test_conversion_to_remote_error() {
        let remote: RemoteError = NetworkError::Status {
            status: 400,
            message: "bad spec".to_string(),
        }
        .into();
        assert!(remote.is_client_error());

        let remote: RemoteError = NetworkError::InvalidResponse("not json".to_string()).into();
        assert_eq!(remote, RemoteError::InvalidResponse("not json".to_string()));
    }
}
