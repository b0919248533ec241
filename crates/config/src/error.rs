//! Error types for configuration loading

use guidesync_core::{ClassifiedError, ErrorClass};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while locating, parsing or validating configuration
///
/// All of these are raised before any remote work begins and abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse config file
    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config files passed explicitly that do not exist
    #[error("Config files not found: {}", display_paths(.0))]
    MissingConfigFiles(Vec<PathBuf>),

    /// No config file could be found at all
    #[error("No configuration files found (looked in {0})")]
    NoConfigFiles(PathBuf),

    /// Instance filters naming instances that no config file declares
    #[error("Unknown instances requested: {}", .0.join(", "))]
    InvalidInstances(Vec<String>),

    /// The same instance name is declared more than once
    #[error("Instances are declared more than once (possibly across files): {}", .0.join(", "))]
    DuplicateInstances(Vec<String>),

    /// One service URL is managed by several instances
    #[error("Instances share a base URL; each service may only be configured once: {}", .0.join(", "))]
    SplitInstances(Vec<String>),

    /// One instance failed validation
    #[error("Config validation failed for instance '{instance}': {}", display_errors(.errors))]
    ValidationError {
        instance: String,
        errors: Vec<ValidationError>,
    },

    /// Config directory path could not be determined
    #[error("Could not determine config directory path: {reason}")]
    PathResolutionError { reason: String },
}

impl ClassifiedError for ConfigError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Configuration
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validation error for a specific config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the field (e.g., "custom_formats[0].trash_ids")
    pub field: String,

    /// Human-readable error message
    pub message: String,

    /// The invalid value, if available
    pub value: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Creates a validation error with the invalid value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field '{}': {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("api_key", "must not be empty");
        assert_eq!(err.to_string(), "Field 'api_key': must not be empty");
    }

    #[test]
    fn test_validation_error_with_value() {
        let err = ValidationError::with_value("base_url", "must use http or https", "ftp://x");
        assert_eq!(
            err.to_string(),
            "Field 'base_url': must use http or https (got: ftp://x)"
        );
    }

    #[test]
    fn test_split_instances_display() {
        let err = ConfigError::SplitInstances(vec!["movies".to_string(), "movies4k".to_string()]);
        let text = err.to_string();
        assert!(text.contains("share a base URL"));
        assert!(text.contains("movies, movies4k"));
    }

    #[test]
    fn test_validation_failure_lists_every_field() {
        let err = ConfigError::ValidationError {
            instance: "movies".to_string(),
            errors: vec![
                ValidationError::new("api_key", "must not be empty"),
                ValidationError::new("base_url", "must not be empty"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("movies"));
        assert!(text.contains("api_key"));
        assert!(text.contains("base_url"));
    }

    #[test]
    fn test_every_config_error_aborts_the_run() {
        let err = ConfigError::InvalidInstances(vec!["x".to_string()]);
        assert!(err.class().aborts_run());
    }
}
