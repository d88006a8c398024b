//! Key reconciliation
//!
//! Compares the keys present on a record with the keys its node declares.

use serde_json::{Map, Value};

use crate::schema::SchemaNode;

/// Keys present on the record but not declared, in record order.
///
/// A node without rules accepts any key.
pub(crate) fn unexpected_keys(record: &Map<String, Value>, node: &SchemaNode) -> Vec<String> {
    if node.rules.is_empty() {
        return Vec::new();
    }
    record
        .keys()
        .filter(|key| !node.declares(key))
        .cloned()
        .collect()
}

/// Inserts `null` for every declared key the record lacks, in declared order.
///
/// Returns the keys that were filled.
pub(crate) fn fill_missing(record: &mut Map<String, Value>, node: &SchemaNode) -> Vec<String> {
    let mut filled = Vec::new();
    for key in node.rules.keys() {
        if !record.contains_key(key) {
            record.insert(key.clone(), Value::Null);
            filled.push(key.clone());
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleEntry;
    use serde_json::json;

    fn node() -> SchemaNode {
        SchemaNode::record()
            .field("a", vec![RuleEntry::rule("safe")])
            .field("b", vec![RuleEntry::rule("safe")])
            .field("c", vec![RuleEntry::rule("safe")])
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unexpected_in_record_order() {
        let record = map(json!({"z": 1, "a": 2, "y": 3}));
        assert_eq!(unexpected_keys(&record, &node()), vec!["z", "y"]);
    }

    #[test]
    fn test_no_rules_accepts_anything() {
        let record = map(json!({"z": 1}));
        assert!(unexpected_keys(&record, &SchemaNode::record()).is_empty());
    }

    #[test]
    fn test_missing_filled_with_null() {
        let mut record = map(json!({"b": 1}));
        let filled = fill_missing(&mut record, &node());
        assert_eq!(filled, vec!["a", "c"]);
        assert_eq!(record.get("a"), Some(&Value::Null));
        assert_eq!(record.get("b"), Some(&json!(1)));
        assert_eq!(record.len(), 3);
    }
}
