//! Size/shape gate
//!
//! Runs before anything else touches a node. A failure fully short-circuits
//! the node: no reconciliation, no chains.

use serde_json::{Map, Value};

use super::collector::ErrorKind;
use crate::rules::RuleFailure;
use crate::schema::SchemaNode;

/// A node rejected by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    pub kind: ErrorKind,
    pub failure: RuleFailure,
}

/// Item count of a container, `None` for scalars and null.
pub(crate) fn container_len(value: &Value) -> Option<usize> {
    match value {
        Value::Object(map) => Some(map.len()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Checks container-ness and size bounds.
pub(crate) fn inspect(value: &Value, node: &SchemaNode) -> Result<usize, Violation> {
    let count = match container_len(value) {
        Some(count) => count,
        None => {
            return Err(Violation {
                kind: ErrorKind::Shape,
                failure: RuleFailure::new(node.messages.not_container.as_str()),
            })
        }
    };

    if let Some(min) = node.min_size {
        if count < min {
            return Err(Violation {
                kind: ErrorKind::TooSmall,
                failure: RuleFailure::new(node.messages.too_small.as_str())
                    .with("min", min)
                    .with("count", count),
            });
        }
    }

    if let Some(max) = node.max_size {
        if count > max {
            return Err(Violation {
                kind: ErrorKind::TooLarge,
                failure: RuleFailure::new(node.messages.too_large.as_str())
                    .with("max", max)
                    .with("count", count),
            });
        }
    }

    Ok(count)
}

/// Views a container as a record. Sequences are keyed by position.
///
/// Non-containers are handed back unchanged.
pub(crate) fn into_record(value: Value) -> Result<Map<String, Value>, Value> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item))
            .collect()),
        other => Err(other),
    }
}

/// Turns a record back into a value.
///
/// A record that came from a sequence becomes a sequence again as long as its
/// keys are still exactly the positions `0..n` in order.
pub(crate) fn from_record(record: Map<String, Value>, was_sequence: bool) -> Value {
    let positional = was_sequence
        && record
            .keys()
            .enumerate()
            .all(|(i, key)| key.parse::<usize>().map_or(false, |k| k == i));

    if positional {
        Value::Array(record.into_iter().map(|(_, v)| v).collect())
    } else {
        Value::Object(record)
    }
}
