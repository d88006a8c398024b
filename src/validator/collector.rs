//! Error collection and aggregation
//!
//! Each invalid node (a record, or a row in each mode) flushes its messages
//! here once its chains have run. The node's own policy decides whether they
//! are prefixed with the structural path and whether they are joined into a
//! single record.

use serde::Serialize;
use std::fmt;

use super::context::KeyPath;
use crate::schema::SchemaNode;

/// Diagnostic taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Value or row is not a container
    Shape,
    /// Container below its minimum size
    TooSmall,
    /// Container above its maximum size
    TooLarge,
    /// Record carries undeclared keys
    UnexpectedKeys,
    /// One or more rules failed on a field
    FieldRule,
}

impl ErrorKind {
    /// Returns the kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Shape => "shape",
            ErrorKind::TooSmall => "too_small",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::UnexpectedKeys => "unexpected_keys",
            ErrorKind::FieldRule => "field_rule",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Rendered path of the node, e.g. `[foo][1]`
    pub path: String,
    /// Diagnostic kind
    pub kind: ErrorKind,
    /// Rendered message
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered accumulation of diagnostics for one top-level call.
#[derive(Debug, Default)]
pub(crate) struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a node-level error (shape, size, unexpected keys).
    pub(crate) fn node_error(
        &mut self,
        node: &SchemaNode,
        path: &KeyPath,
        kind: ErrorKind,
        message: String,
    ) {
        let path = path.to_string();
        let message = decorate(node, &path, message);
        self.records.push(ErrorRecord { path, kind, message });
    }

    /// Records the field-rule messages of one invalid node.
    pub(crate) fn field_errors(
        &mut self,
        node: &SchemaNode,
        path: &KeyPath,
        messages: Vec<String>,
    ) {
        if messages.is_empty() {
            return;
        }

        let path = path.to_string();
        let messages: Vec<String> = messages
            .into_iter()
            .map(|message| decorate(node, &path, message))
            .collect();

        if node.compact_errors {
            self.records.push(ErrorRecord {
                path,
                kind: ErrorKind::FieldRule,
                message: messages.join(&node.error_separator),
            });
        } else {
            self.records.extend(messages.into_iter().map(|message| ErrorRecord {
                path: path.clone(),
                kind: ErrorKind::FieldRule,
                message,
            }));
        }
    }

    pub(crate) fn into_records(self) -> Vec<ErrorRecord> {
        self.records
    }
}

fn decorate(node: &SchemaNode, path: &str, message: String) -> String {
    if node.prefix_errors {
        format!("{}{}", path, message)
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::PathSegment;

    fn path() -> KeyPath {
        KeyPath::root()
            .join(PathSegment::Key("foo".into()))
            .join(PathSegment::Index(1))
    }

    fn messages() -> Vec<String> {
        vec!["x is bad.".to_string(), "y is bad.".to_string()]
    }

    #[test]
    fn test_exploded_prefixed() {
        let mut collector = ErrorCollector::new();
        collector.field_errors(&SchemaNode::each(), &path(), messages());
        let records = collector.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "[foo][1]x is bad.");
        assert_eq!(records[1].path, "[foo][1]");
        assert_eq!(records[1].kind, ErrorKind::FieldRule);
    }

    #[test]
    fn test_compact_joins_with_separator() {
        let node = SchemaNode::each().compact_errors(true).error_separator("; ");
        let mut collector = ErrorCollector::new();
        collector.field_errors(&node, &path(), messages());
        let records = collector.into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "[foo][1]x is bad.; [foo][1]y is bad.");
    }

    #[test]
    fn test_no_prefix() {
        let node = SchemaNode::each().prefix_errors(false);
        let mut collector = ErrorCollector::new();
        collector.field_errors(&node, &path(), messages());
        let records = collector.into_records();
        assert_eq!(records[0].message, "x is bad.");
        assert_eq!(records[0].path, "[foo][1]");
    }

    #[test]
    fn test_empty_messages_add_nothing() {
        let mut collector = ErrorCollector::new();
        collector.field_errors(&SchemaNode::record(), &path(), Vec::new());
        assert!(collector.into_records().is_empty());
    }

    #[test]
    fn test_node_error_prefixed() {
        let mut collector = ErrorCollector::new();
        collector.node_error(
            &SchemaNode::record(),
            &path(),
            ErrorKind::UnexpectedKeys,
            "value contains unexpected items z".into(),
        );
        let records = collector.into_records();
        assert_eq!(records[0].message, "[foo][1]value contains unexpected items z");
        assert_eq!(records[0].kind.to_string(), "unexpected_keys");
    }
}
