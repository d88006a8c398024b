//! Schema error types
//!
//! These describe problems with the schema itself, never with validated data.

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema construction and loading errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("rule '{rule}' at {location} is not supported: {reason}")]
    UnsupportedRule {
        rule: String,
        location: String,
        reason: String,
    },

    #[error("rule '{rule}' at {location} requires option '{option}'")]
    MissingOption {
        rule: String,
        option: String,
        location: String,
    },

    #[error("rule '{rule}' at {location} has invalid option '{option}': {reason}")]
    InvalidOption {
        rule: String,
        option: String,
        location: String,
        reason: String,
    },

    #[error("invalid size bounds at {location}: min {min} exceeds max {max}")]
    InvalidBounds {
        location: String,
        min: usize,
        max: usize,
    },

    #[error("unknown predicate '{0}'")]
    UnknownPredicate(String),

    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("schema '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("schema name '{0}' is not a valid file name")]
    InvalidName(String),

    #[error("malformed schema file '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl SchemaError {
    /// Stable error code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::UnsupportedRule { .. } => "SCHEMA_UNSUPPORTED_RULE",
            SchemaError::MissingOption { .. } => "SCHEMA_MISSING_OPTION",
            SchemaError::InvalidOption { .. } => "SCHEMA_INVALID_OPTION",
            SchemaError::InvalidBounds { .. } => "SCHEMA_INVALID_BOUNDS",
            SchemaError::UnknownPredicate(_) => "SCHEMA_UNKNOWN_PREDICATE",
            SchemaError::UnknownFilter(_) => "SCHEMA_UNKNOWN_FILTER",
            SchemaError::AlreadyRegistered(_) => "SCHEMA_ALREADY_REGISTERED",
            SchemaError::InvalidName(_) => "SCHEMA_INVALID_NAME",
            SchemaError::Malformed { .. } => "SCHEMA_MALFORMED",
        }
    }

    /// Create an error for a malformed schema file
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
