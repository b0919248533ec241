// crates/sync-engine/src/error.rs
//! Error types for reconciliation

use guidesync_core::{ClassifiedError, ErrorClass, RecordKind, RemoteError};
use guidesync_guide::GuideError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// A desired document that cannot be merged onto its remote counterpart
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// Top level of a document must be an object
    #[error("{side} document is not an object")]
    NotAnObject { side: &'static str },

    /// `specifications` is present but has the wrong shape
    #[error("Invalid specifications: {0}")]
    InvalidSpecifications(String),
}

impl ClassifiedError for MergeError {
    fn class(&self) -> ErrorClass {
        ErrorClass::LocalPrecondition
    }
}

/// Errors that can occur during reconciliation
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed; the rest of the instance is abandoned
    #[error("Failed to {action} {kind} {record}: {source}")]
    Remote {
        action: &'static str,
        kind: RecordKind,
        record: String,
        source: RemoteError,
    },

    /// A remote document lacks the fields every record carries
    #[error("Invalid {kind} returned by the service: {reason}")]
    InvalidRemoteRecord { kind: RecordKind, reason: String },

    /// Guide data could not be read
    #[error(transparent)]
    Guide(#[from] GuideError),

    /// Identity cache file could not be read or written
    #[error("Cache error at {path}: {reason}")]
    Cache { path: PathBuf, reason: String },

    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl SyncError {
    pub(crate) fn remote(
        action: &'static str,
        kind: RecordKind,
        record: impl Into<String>,
        source: RemoteError,
    ) -> Self {
        SyncError::Remote {
            action,
            kind,
            record: record.into(),
            source,
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        SyncError::Custom("Lock poisoned".to_string())
    }
}

impl ClassifiedError for SyncError {
    fn class(&self) -> ErrorClass {
        match self {
            SyncError::Remote { .. } | SyncError::InvalidRemoteRecord { .. } => {
                ErrorClass::RemoteCall
            }
            SyncError::Guide(e) => e.class(),
            SyncError::Cache { .. } | SyncError::Custom(_) => ErrorClass::RemoteCall,
        }
    }
}
