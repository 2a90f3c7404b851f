//! Reconciliation error types.
//!
//! Every error is fatal to the run it occurs in: nothing is retried and
//! nothing already applied is rolled back.

use std::fmt;

use octoacs_store::{ResourceKind, StoreError};

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that can end a reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A lookup expected to be unique matched zero or several resources.
    #[error("Precondition violated: found {found} {kind} resources named '{name}'")]
    PreconditionViolation {
        /// The kind of resource looked up.
        kind: ResourceKind,
        /// The name used for the lookup.
        name: String,
        /// How many resources matched.
        found: usize,
    },

    /// The management store rejected a call. The store error is kept as is.
    #[error(transparent)]
    Remote(#[from] StoreError),

    /// A required spec field was absent when the command executed.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the missing or invalid field.
        message: String,
    },

    /// A rule group link pattern is not a valid regular expression.
    #[error("Invalid rule group pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },
}

impl ReconcileError {
    /// Creates a new `PreconditionViolation` error.
    #[must_use]
    pub fn precondition(kind: ResourceKind, name: impl Into<String>, found: usize) -> Self {
        Self::PreconditionViolation {
            kind,
            name: name.into(),
            found,
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error for a required field left unset.
    #[must_use]
    pub fn missing_field(resource: &str, field: &str) -> Self {
        Self::configuration(format!("{resource} is missing required field '{field}'"))
    }

    /// Returns `true` if a uniqueness assumption failed.
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::PreconditionViolation { .. })
    }

    /// Returns `true` if the store rejected a call.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::PreconditionViolation { .. } => ErrorCategory::PreconditionViolation,
            Self::Remote(_) => ErrorCategory::RemoteOperationFailure,
            Self::Configuration { .. } | Self::InvalidPattern { .. } => {
                ErrorCategory::ConfigurationError
            }
        }
    }
}

/// Categories of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Prior remote state broke a uniqueness assumption.
    PreconditionViolation,
    /// A store call failed.
    RemoteOperationFailure,
    /// The spec was incomplete or malformed.
    ConfigurationError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreconditionViolation => write!(f, "precondition_violation"),
            Self::RemoteOperationFailure => write!(f, "remote_operation_failure"),
            Self::ConfigurationError => write!(f, "configuration_error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::precondition(ResourceKind::RelyingParty, "portal", 2);
        assert_eq!(
            err.to_string(),
            "Precondition violated: found 2 RelyingParty resources named 'portal'"
        );

        let err = ReconcileError::missing_field("relying party", "name");
        assert_eq!(
            err.to_string(),
            "Configuration error: relying party is missing required field 'name'"
        );
    }

    #[test]
    fn test_remote_error_is_transparent() {
        let store_err = StoreError::connection("timed out");
        let expected = store_err.to_string();

        let err = ReconcileError::from(store_err);

        assert!(err.is_remote());
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            ReconcileError::precondition(ResourceKind::RuleGroup, "g", 0).category(),
            ErrorCategory::PreconditionViolation
        );
        assert_eq!(
            ReconcileError::from(StoreError::batch("x")).category(),
            ErrorCategory::RemoteOperationFailure
        );
        assert_eq!(
            ReconcileError::configuration("x").category(),
            ErrorCategory::ConfigurationError
        );
        assert_eq!(
            ErrorCategory::ConfigurationError.to_string(),
            "configuration_error"
        );
    }
}
