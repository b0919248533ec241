//! Guide data access
//!
//! The guide is the community-maintained source of recommended custom
//! formats and release profiles. This crate only reads it; fetching and
//! updating a local checkout is somebody else's job.

mod local;
mod models;
mod traits;

pub use local::LocalGuide;
pub use models::{GuideCustomFormat, PreferredTermData, ReleaseProfileData, TermData};
pub use traits::GuideProvider;

use guidesync_core::{ClassifiedError, ErrorClass};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for guide operations
pub type GuideResult<T> = Result<T, GuideError>;

/// Errors from guide providers
#[derive(Debug, Error)]
pub enum GuideError {
    /// Guide directory does not exist
    #[error("Guide directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// Directory could not be listed
    #[error("Failed to read guide directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A guide document is not valid JSON or lacks required fields
    #[error("Invalid guide document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// A document lacks a field every guide entry carries
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A document does not have the expected shape
    #[error("{0}")]
    Malformed(String),
}

impl ClassifiedError for GuideError {
    fn class(&self) -> ErrorClass {
        match self {
            GuideError::InvalidDocument { .. }
            | GuideError::MissingField(_)
            | GuideError::Malformed(_) => ErrorClass::LocalPrecondition,
            GuideError::MissingDirectory(_) | GuideError::Io { .. } => ErrorClass::Configuration,
        }
    }
}
