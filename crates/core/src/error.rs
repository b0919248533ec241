//! Error taxonomy shared by all guidesync crates
//!
//! Every crate keeps its own error enum, but each one maps its variants onto
//! an [`ErrorClass`]. The class decides the blast radius of a failure:
//! - **LocalPrecondition**: only the affected record is skipped
//! - **RemoteCall**: the rest of the current instance is abandoned
//! - **Configuration**: the whole run is aborted before any remote work
//!
//! Informational omissions (an unresolved guide reference, a missing score)
//! are never errors; they are logged where they are found and skipped.

use std::fmt;

/// How far a failure is allowed to propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorClass {
    /// Malformed or unmergeable desired document
    LocalPrecondition,
    /// Network, auth or HTTP status failure against a service instance
    RemoteCall,
    /// Inconsistent configuration; the instance set cannot be determined
    Configuration,
}

impl ErrorClass {
    /// Returns true if the error stops the run for every instance
    pub fn aborts_run(&self) -> bool {
        matches!(self, Self::Configuration)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPrecondition => write!(f, "Local precondition"),
            Self::RemoteCall => write!(f, "Remote call"),
            Self::Configuration => write!(f, "Configuration"),
        }
    }
}

/// Implemented by crate-level error enums so callers can decide severity
/// without matching on foreign variants.
pub trait ClassifiedError: std::error::Error {
    fn class(&self) -> ErrorClass;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_aborts_run() {
        assert!(ErrorClass::Configuration.aborts_run());
        assert!(!ErrorClass::RemoteCall.aborts_run());
        assert!(!ErrorClass::LocalPrecondition.aborts_run());
    }

    #[test]
    fn test_ordering_by_severity() {
        assert!(ErrorClass::LocalPrecondition < ErrorClass::RemoteCall);
        assert!(ErrorClass::RemoteCall < ErrorClass::Configuration);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorClass::RemoteCall.to_string(), "Remote call");
    }
}
