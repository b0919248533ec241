//! Contract for talking to a managed service instance
//!
//! Documents cross this boundary as `serde_json::Value`; the engine never
//! depends on the transport that carries them.

use crate::error::{ClassifiedError, ErrorClass};
use crate::types::{RecordKind, RemoteId};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result type for remote API calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be interpreted
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns true for 4xx statuses: the service rejected this one record
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }
}

impl ClassifiedError for RemoteError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RemoteCall
    }
}

/// Record CRUD against one service instance
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches every record of one kind
    async fn get_records(&self, kind: RecordKind) -> RemoteResult<Vec<Value>>;

    /// Creates a record and returns it as stored, including its new id
    async fn create_record(&self, kind: RecordKind, payload: &Value) -> RemoteResult<Value>;

    /// Replaces an existing record
    async fn update_record(&self, kind: RecordKind, id: &RemoteId, payload: &Value)
        -> RemoteResult<()>;

    /// Deletes an existing record
    async fn delete_record(&self, kind: RecordKind, id: &RemoteId) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_detection() {
        let not_found = RemoteError::Status {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(not_found.is_client_error());

        let server = RemoteError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert!(!server.is_client_error());
        assert!(!RemoteError::Transport("reset".to_string()).is_client_error());
    }

    #[test]
    fn test_remote_errors_do_not_abort_run() {
        let err = RemoteError::Transport("connection refused".to_string());
        assert_eq!(err.class(), ErrorClass::RemoteCall);
        assert!(!err.class().aborts_run());
    }
}
