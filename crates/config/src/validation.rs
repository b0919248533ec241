//! Validation of configuration values
//!
//! Config sections implement [`ConfigSection`] and collect every problem they
//! find instead of stopping at the first one, so a user can fix a file in one
//! pass.

pub use crate::error::ValidationError;

/// Trait for configuration sections that can validate themselves
pub trait ConfigSection {
    /// Validates the section; `path` is the dotted prefix used in error fields
    fn validate(&self, path: &str) -> Result<(), Vec<ValidationError>>;
}

/// Common validators for config values
pub struct Validator;

impl Validator {
    /// Validates that a string is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::new(field, "must not be empty"))
        } else {
            Ok(())
        }
    }

    /// Validates that a URL is present and uses http or https
    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        Self::not_empty(value, field)?;

        let lower = value.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(())
        } else {
            Err(ValidationError::with_value(
                field,
                "must start with http:// or https://",
                value,
            ))
        }
    }

    /// Validates that a list has at least one element
    pub fn not_empty_list<T>(values: &[T], field: &str) -> Result<(), ValidationError> {
        if values.is_empty() {
            Err(ValidationError::new(field, "must contain at least one entry"))
        } else {
            Ok(())
        }
    }

    /// Collects results into a single Result with all errors
    pub fn collect_errors(
        results: Vec<Result<(), ValidationError>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = results.into_iter().filter_map(|r| r.err()).collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Flattens nested section results into one list
    pub fn merge_section_errors(
        results: impl IntoIterator<Item = Result<(), Vec<ValidationError>>>,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = results
            .into_iter()
            .filter_map(|r| r.err())
            .flatten()
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
