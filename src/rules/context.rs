//! Explicit context handed to predicates and custom rules
//!
//! Custom logic sees exactly five things: the local record, the key under
//! evaluation, the row index (each mode only), the root value and the name the
//! root is known by. Scenario and path are exposed for convenience.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::message::MessageParams;
use crate::validator::{KeyPath, RowIndex};

/// Read-only view of the frame a rule entry runs in.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Local record (one record, or one row in each mode)
    pub record: &'a Map<String, Value>,
    /// Key whose chain is running
    pub key: &'a str,
    /// Row index in each mode, `None` in record mode
    pub index: Option<&'a RowIndex>,
    /// Value passed to the top-level call
    pub root: &'a Value,
    /// Name the root value is known by
    pub root_key: &'a str,
    /// Active scenario
    pub scenario: &'a str,
    /// Path of the record being validated
    pub path: &'a KeyPath,
}

impl<'a> RuleContext<'a> {
    /// Current value of the field under evaluation.
    pub fn value(&self) -> &'a Value {
        self.record.get(self.key).unwrap_or(&Value::Null)
    }

    /// Current value of a sibling field.
    pub fn sibling(&self, key: &str) -> Option<&'a Value> {
        self.record.get(key)
    }
}

/// A failed check: template plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Message template
    pub template: String,
    /// Template parameters
    pub params: MessageParams,
}

impl RuleFailure {
    /// Failure without parameters.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            params: MessageParams::new(),
        }
    }

    /// Adds a template parameter.
    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }
}

/// Sink through which custom rules report problems with the current field.
#[derive(Debug, Default)]
pub struct FieldErrors {
    failures: Vec<RuleFailure>,
}

impl FieldErrors {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message. Placeholders such as `{attribute}` are still rendered.
    pub fn add(&mut self, message: impl Into<String>) {
        self.failures.push(RuleFailure::new(message));
    }

    /// Appends a templated message.
    pub fn add_failure(&mut self, failure: RuleFailure) {
        self.failures.push(failure);
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of reported problems.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Consumes the sink.
    pub fn into_failures(self) -> Vec<RuleFailure> {
        self.failures
    }
}

/// Gating predicate (`when`).
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&RuleContext<'_>) -> bool + Send + Sync>);

impl Predicate {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluates the predicate.
    pub fn test(&self, ctx: &RuleContext<'_>) -> bool {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Arbitrary user logic run against the current field.
#[derive(Clone)]
pub struct CustomRule(Arc<dyn Fn(&RuleContext<'_>, &mut FieldErrors) + Send + Sync>);

impl CustomRule {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &mut FieldErrors) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the rule.
    pub fn run(&self, ctx: &RuleContext<'_>, errors: &mut FieldErrors) {
        (self.0)(ctx, errors)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}

/// Value transform used by the `filter` rule.
#[derive(Clone)]
pub struct ValueFilter(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl ValueFilter {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Applies the transform.
    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueFilter(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Map<String, Value> {
        match json!({"a": 1, "b": "x"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_context_value_and_sibling() {
        let record = record();
        let root = json!({"value": {"a": 1}});
        let path = KeyPath::root();
        let ctx = RuleContext {
            record: &record,
            key: "a",
            index: None,
            root: &root,
            root_key: "value",
            scenario: "default",
            path: &path,
        };
        assert_eq!(ctx.value(), &json!(1));
        assert_eq!(ctx.sibling("b"), Some(&json!("x")));
        assert_eq!(ctx.sibling("zzz"), None);
    }

    #[test]
    fn test_custom_rule_reports() {
        let record = record();
        let root = Value::Null;
        let path = KeyPath::root();
        let ctx = RuleContext {
            record: &record,
            key: "b",
            index: None,
            root: &root,
            root_key: "value",
            scenario: "default",
            path: &path,
        };
        let rule = CustomRule::new(|ctx, errors| {
            if ctx.value() != &json!("foo") {
                errors.add(format!("{} is not foo", ctx.key));
            }
        });
        let mut errors = FieldErrors::new();
        rule.run(&ctx, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.into_failures()[0].template, "b is not foo");
    }

    #[test]
    fn test_filter_applies() {
        let inc = ValueFilter::new(|v| json!(v.as_i64().unwrap_or(0) + 10));
        assert_eq!(inc.apply(json!(1)), json!(11));
    }

    #[test]
    fn test_failure_params() {
        let failure = RuleFailure::new("{attribute} too big").with("max", 3);
        assert_eq!(failure.params.get("max").map(String::as_str), Some("3"));
    }
}
