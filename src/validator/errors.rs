//! Validation fault types
//!
//! Invalid data is never an error: it is reported through
//! [`ErrorRecord`](super::ErrorRecord)s. These faults mean the schema cannot be
//! executed as configured and abort the whole call.

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for validation calls
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration faults raised during validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule '{rule}' is not supported: {reason}")]
    Unsupported { rule: String, reason: String },

    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("invalid schema: {0}")]
    Schema(SchemaError),
}

impl ValidationError {
    /// Fault for a persistence-backed rule.
    pub fn unsupported(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Unsupported {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Whether the fault is an unsupported operation.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ValidationError::Unsupported { .. })
    }

    /// Stable error code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Unsupported { .. } => "VALIDATION_UNSUPPORTED_OPERATION",
            ValidationError::UnknownRule(_) => "VALIDATION_UNKNOWN_RULE",
            ValidationError::Schema(e) => e.code(),
        }
    }
}

impl From<SchemaError> for ValidationError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnsupportedRule {
                rule,
                location,
                reason,
            } => ValidationError::Unsupported {
                rule,
                reason: format!("{} (at {})", reason, location),
            },
            other => ValidationError::Schema(other),
        }
    }
}
