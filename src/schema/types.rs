//! Schema type definitions
//!
//! A [`SchemaNode`] describes one container: how big it may be, whether it is a
//! single record or a sequence of rows, and the ordered rule chain of every
//! declared key. Nodes are built once and never mutated afterwards; nested
//! nodes are shared through `Arc`.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use crate::rules::{
    compile_pattern, CustomRule, FieldErrors, Predicate, RuleContext, RuleId, ValueFilter,
};

/// Default template for a non-container value.
pub const NOT_CONTAINER_MESSAGE: &str = "{attribute} must be a list or a map.";
/// Default template for a container below `min_size`.
pub const TOO_SMALL_MESSAGE: &str =
    "{attribute} is too small, it should contain at least {min} items.";
/// Default template for a container above `max_size`.
pub const TOO_LARGE_MESSAGE: &str =
    "{attribute} is too large, it should contain at most {max} items.";
/// Default template for undeclared keys.
pub const UNEXPECTED_ITEMS_MESSAGE: &str = "{attribute} contains unexpected items {items}";

/// Node-level message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMessages {
    /// Value (or row) is not a container
    pub not_container: String,
    /// Fewer items than `min_size`
    pub too_small: String,
    /// More items than `max_size`
    pub too_large: String,
    /// Keys outside the declared set
    pub unexpected_items: String,
}

impl Default for NodeMessages {
    fn default() -> Self {
        Self {
            not_container: NOT_CONTAINER_MESSAGE.to_string(),
            too_small: TOO_SMALL_MESSAGE.to_string(),
            too_large: TOO_LARGE_MESSAGE.to_string(),
            unexpected_items: UNEXPECTED_ITEMS_MESSAGE.to_string(),
        }
    }
}

/// What a rule entry dispatches to.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Capability resolved through the rule registry
    Builtin(RuleId),
    /// Closure run with the explicit rule context
    Custom(CustomRule),
    /// Recurse into a nested schema
    Nested(Arc<SchemaNode>),
}

/// Options shared by every rule entry, plus rule-specific parameters.
#[derive(Debug, Clone, Default)]
pub struct RuleOptions {
    /// Scenarios the entry is limited to (empty = all)
    pub on: Vec<String>,
    /// Scenarios the entry never runs in
    pub except: Vec<String>,
    /// Predicate evaluated after scenario gating
    pub when: Option<Predicate>,
    /// Template replacing the rule's own failure message
    pub message: Option<String>,
    /// Overrides the capability's skip-on-empty default
    pub skip_on_empty: Option<bool>,
    /// Transform used by the `filter` rule
    pub filter: Option<ValueFilter>,
    /// Rule-specific parameters (`min`, `max`, `value`, `range`, ...)
    pub params: Map<String, Value>,
}

impl RuleOptions {
    /// Returns a rule-specific parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    /// Returns a parameter as a signed integer.
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(Value::as_i64)
    }

    /// Returns a parameter as a float.
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(Value::as_f64)
    }

    /// Returns a parameter as a string.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// Returns a boolean parameter, `false` when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.param(name).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// One entry of a rule chain.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Dispatch target
    pub kind: RuleKind,
    /// Gating and rule options
    pub options: RuleOptions,
}

impl RuleEntry {
    /// Entry dispatched to a registry capability.
    pub fn rule(id: impl Into<RuleId>) -> Self {
        Self {
            kind: RuleKind::Builtin(id.into()),
            options: RuleOptions::default(),
        }
    }

    /// Entry running a custom closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &mut FieldErrors) + Send + Sync + 'static,
    {
        Self {
            kind: RuleKind::Custom(CustomRule::new(f)),
            options: RuleOptions::default(),
        }
    }

    /// Entry recursing into a nested schema.
    pub fn nested(node: SchemaNode) -> Self {
        Self {
            kind: RuleKind::Nested(Arc::new(node)),
            options: RuleOptions::default(),
        }
    }

    /// `filter` entry with its transform.
    pub fn filter<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        let mut entry = Self::rule(RuleId::Filter);
        entry.options.filter = Some(ValueFilter::new(f));
        entry
    }

    /// Sets a rule-specific parameter.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options.params.insert(name.to_string(), value.into());
        self
    }

    /// Limits the entry to the given scenarios.
    pub fn on<I, S>(mut self, scenarios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.on = scenarios.into_iter().map(Into::into).collect();
        self
    }

    /// Excludes the entry from the given scenarios.
    pub fn except<I, S>(mut self, scenarios: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.except = scenarios.into_iter().map(Into::into).collect();
        self
    }

    /// Runs the entry only when the predicate holds.
    pub fn when<F>(mut self, f: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.options.when = Some(Predicate::new(f));
        self
    }

    /// Overrides the failure message template.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.options.message = Some(template.into());
        self
    }

    /// Overrides whether empty values skip the check.
    pub fn skip_on_empty(mut self, skip: bool) -> Self {
        self.options.skip_on_empty = Some(skip);
        self
    }
}

/// Ordered rules applied to one field.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    entries: Vec<RuleEntry>,
}

impl RuleChain {
    /// Creates a chain from entries, keeping their order.
    pub fn new(entries: Vec<RuleEntry>) -> Self {
        Self { entries }
    }

    /// Returns the entries in evaluation order.
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: RuleEntry) {
        self.entries.push(entry);
    }

    /// Whether the chain has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<RuleEntry>> for RuleChain {
    fn from(entries: Vec<RuleEntry>) -> Self {
        Self::new(entries)
    }
}

impl FromIterator<RuleEntry> for RuleChain {
    fn from_iter<T: IntoIterator<Item = RuleEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Declarative description of one container.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Minimum item count, unchecked when `None`
    pub min_size: Option<usize>,
    /// Maximum item count, unchecked when `None`
    pub max_size: Option<usize>,
    /// Validate each row instead of the container itself
    pub each: bool,
    /// Write transformed values back into the result
    pub mutable: bool,
    /// Stop a chain at its first failure and rows at the first invalid row
    pub stop_on_first_error: bool,
    /// One joined message per invalid node
    pub compact_errors: bool,
    /// Prefix messages with the structural path
    pub prefix_errors: bool,
    /// Separator used when joining compact messages
    pub error_separator: String,
    /// Node-level message templates
    pub messages: NodeMessages,
    /// Declared keys and their chains, in declared order
    pub rules: IndexMap<String, RuleChain>,
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self {
            min_size: None,
            max_size: None,
            each: false,
            mutable: true,
            stop_on_first_error: true,
            compact_errors: false,
            prefix_errors: true,
            error_separator: "\n".to_string(),
            messages: NodeMessages::default(),
            rules: IndexMap::new(),
        }
    }
}

impl SchemaNode {
    /// Node validating a single record.
    pub fn record() -> Self {
        Self::default()
    }

    /// Node validating each row of a sequence.
    pub fn each() -> Self {
        Self {
            each: true,
            ..Self::default()
        }
    }

    /// Declares a key with its chain. Redeclaring a key replaces its chain.
    pub fn field(mut self, key: impl Into<String>, chain: impl Into<RuleChain>) -> Self {
        self.rules.insert(key.into(), chain.into());
        self
    }

    /// Sets the minimum item count.
    pub fn min_size(mut self, min: usize) -> Self {
        self.min_size = Some(min);
        self
    }

    /// Sets the maximum item count.
    pub fn max_size(mut self, max: usize) -> Self {
        self.max_size = Some(max);
        self
    }

    /// Sets the mutation policy.
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    /// Sets the stop policy.
    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    /// Sets the aggregation policy.
    pub fn compact_errors(mut self, compact: bool) -> Self {
        self.compact_errors = compact;
        self
    }

    /// Sets the prefix policy.
    pub fn prefix_errors(mut self, prefix: bool) -> Self {
        self.prefix_errors = prefix;
        self
    }

    /// Sets the compact-message separator.
    pub fn error_separator(mut self, separator: impl Into<String>) -> Self {
        self.error_separator = separator.into();
        self
    }

    /// Overrides the non-container template.
    pub fn message_not_container(mut self, template: impl Into<String>) -> Self {
        self.messages.not_container = template.into();
        self
    }

    /// Overrides the too-small template.
    pub fn message_too_small(mut self, template: impl Into<String>) -> Self {
        self.messages.too_small = template.into();
        self
    }

    /// Overrides the too-large template.
    pub fn message_too_large(mut self, template: impl Into<String>) -> Self {
        self.messages.too_large = template.into();
        self
    }

    /// Overrides the unexpected-items template.
    pub fn message_unexpected_items(mut self, template: impl Into<String>) -> Self {
        self.messages.unexpected_items = template.into();
        self
    }

    /// Whether `key` is declared.
    pub fn declares(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    /// Validates the node tree itself (not a value).
    ///
    /// Rejected configurations:
    /// - `exist` inside an each-mode node
    /// - `filter` entries without a transform
    /// - `match` entries without a compilable pattern
    /// - `min_size` greater than `max_size`
    pub fn validate_structure(&self) -> SchemaResult<()> {
        self.validate_structure_at("")
    }

    fn validate_structure_at(&self, location: &str) -> SchemaResult<()> {
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(SchemaError::InvalidBounds {
                    location: display_location(location),
                    min,
                    max,
                });
            }
        }

        for (key, chain) in &self.rules {
            let key_location = format!("{}[{}]", location, key);
            for entry in chain.entries() {
                match &entry.kind {
                    RuleKind::Builtin(RuleId::Exist) if self.each => {
                        return Err(SchemaError::UnsupportedRule {
                            rule: RuleId::Exist.to_string(),
                            location: key_location,
                            reason: "existence checks are not defined per row of a \
                                     multidimensional structure"
                                .to_string(),
                        });
                    }
                    RuleKind::Builtin(RuleId::Filter) if entry.options.filter.is_none() => {
                        return Err(SchemaError::MissingOption {
                            rule: RuleId::Filter.to_string(),
                            option: "filter".to_string(),
                            location: key_location,
                        });
                    }
                    RuleKind::Builtin(RuleId::Match) => match entry.options.param_str("pattern") {
                        None => {
                            return Err(SchemaError::MissingOption {
                                rule: RuleId::Match.to_string(),
                                option: "pattern".to_string(),
                                location: key_location,
                            });
                        }
                        Some(pattern) => {
                            compile_pattern(pattern).map_err(|e| SchemaError::InvalidOption {
                                rule: RuleId::Match.to_string(),
                                option: "pattern".to_string(),
                                location: key_location.clone(),
                                reason: e.to_string(),
                            })?;
                        }
                    },
                    RuleKind::Nested(child) => child.validate_structure_at(&key_location)?,
                    _ => {}
                }
            }
        }

        Ok(())
    }
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "<root>".to_string()
    } else {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> SchemaNode {
        SchemaNode::record()
            .field(
                "id",
                vec![RuleEntry::rule("required"), RuleEntry::rule("integer").with("min", 0)],
            )
            .field(
                "name",
                vec![RuleEntry::rule("trim"), RuleEntry::rule("string").with("max", 100)],
            )
    }

    #[test]
    fn test_defaults() {
        let node = SchemaNode::record();
        assert!(!node.each);
        assert!(node.mutable);
        assert!(node.stop_on_first_error);
        assert!(!node.compact_errors);
        assert!(node.prefix_errors);
        assert_eq!(node.error_separator, "\n");
        assert!(SchemaNode::each().each);
    }

    #[test]
    fn test_declared_order_kept() {
        let node = sample_node().field("age", vec![RuleEntry::rule("integer")]);
        let keys: Vec<_> = node.rules.keys().cloned().collect();
        assert_eq!(keys, vec!["id", "name", "age"]);
        assert!(node.declares("name"));
        assert!(!node.declares("other"));
    }

    #[test]
    fn test_structure_valid() {
        assert!(sample_node().validate_structure().is_ok());
    }

    #[test]
    fn test_exist_rejected_in_each_node() {
        let node = SchemaNode::each().field("a", vec![RuleEntry::rule("exist")]);
        let err = node.validate_structure().unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedRule { .. }));
        assert!(err.to_string().contains("[a]"));
    }

    #[test]
    fn test_exist_in_nested_each_rejected() {
        let inner = SchemaNode::each().field("x", vec![RuleEntry::rule("exist")]);
        let node = SchemaNode::record().field("rows", vec![RuleEntry::nested(inner)]);
        let err = node.validate_structure().unwrap_err();
        assert!(err.to_string().contains("[rows][x]"));
    }

    #[test]
    fn test_exist_allowed_in_record_node_structure() {
        let node = SchemaNode::record().field("a", vec![RuleEntry::rule("exist")]);
        assert!(node.validate_structure().is_ok());
    }

    #[test]
    fn test_filter_without_transform_rejected() {
        let node = SchemaNode::record().field("a", vec![RuleEntry::rule("filter")]);
        assert!(matches!(
            node.validate_structure(),
            Err(SchemaError::MissingOption { .. })
        ));
    }

    #[test]
    fn test_match_pattern_checked() {
        let missing = SchemaNode::record().field("a", vec![RuleEntry::rule("match")]);
        assert!(matches!(
            missing.validate_structure(),
            Err(SchemaError::MissingOption { .. })
        ));

        let broken = SchemaNode::record()
            .field("a", vec![RuleEntry::rule("match").with("pattern", "(")]);
        assert!(matches!(
            broken.validate_structure(),
            Err(SchemaError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let node = SchemaNode::record().min_size(3).max_size(2);
        assert!(matches!(
            node.validate_structure(),
            Err(SchemaError::InvalidBounds { min: 3, max: 2, .. })
        ));
    }

    #[test]
    fn test_options_params() {
        let entry = RuleEntry::rule("integer").with("min", 1).with("strict", true);
        assert_eq!(entry.options.param_i64("min"), Some(1));
        assert!(entry.options.flag("strict"));
        assert!(!entry.options.flag("not"));
        assert_eq!(entry.options.param_str("min"), None);
    }
}
