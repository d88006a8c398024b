//! Observable events emitted by the engine
//!
//! Events are explicit and typed. They are logged through `tracing` as the
//! `event` field of a structured record, e.g.
//!
//! ```ignore
//! tracing::debug!(event = %Event::RowRejected, path = %path, "row is not a container");
//! ```
//!
//! The library never installs a subscriber; hosts decide where records go.

use std::fmt;

/// Observable events in a validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Top-level validation starts
    ValidationBegin,
    /// Top-level validation finished (valid or not)
    ValidationComplete,
    /// Validation aborted by a configuration fault
    ValidationFault,
    /// A node failed the size/shape gate
    NodeRejected,
    /// An each-mode row is not a container
    RowRejected,
    /// A record carries keys the schema does not declare
    KeysUnexpected,
    /// A rule entry was gated out by scenario or predicate
    RuleSkipped,
    /// Row processing stopped after the first invalid row
    RowsStopped,
    /// Schema definitions loaded from disk
    SchemasLoaded,
}

impl Event {
    /// Returns the event name used in log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ValidationBegin => "VALIDATION_BEGIN",
            Event::ValidationComplete => "VALIDATION_COMPLETE",
            Event::ValidationFault => "VALIDATION_FAULT",
            Event::NodeRejected => "NODE_REJECTED",
            Event::RowRejected => "ROW_REJECTED",
            Event::KeysUnexpected => "KEYS_UNEXPECTED",
            Event::RuleSkipped => "RULE_SKIPPED",
            Event::RowsStopped => "ROWS_STOPPED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::ValidationBegin.as_str(), "VALIDATION_BEGIN");
        assert_eq!(Event::RowsStopped.to_string(), "ROWS_STOPPED");
        assert_eq!(Event::SchemasLoaded.as_str(), "SCHEMAS_LOADED");
    }
}
