//! Validation entry point
//!
//! A [`Validator`] borrows its two collaborators and holds no state between
//! calls. Each call:
//! 1. checks the schema tree itself
//! 2. walks the value (size gate, then records or rows)
//! 3. returns validity, the ordered error list and the resulting value
//!
//! Data problems never surface as `Err`. Only configuration faults do, and
//! they abort the whole call.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::collector::ErrorRecord;
use super::context::ValidationContext;
use super::errors::ValidationResult;
use super::traversal::{NodeResult, Walker};
use crate::message::{MessageFormatter, TemplateFormatter};
use crate::observability::Event;
use crate::rules::RuleRegistry;
use crate::schema::SchemaNode;

/// Name the root value is known by in [`Validator::validate`].
pub const DEFAULT_ROOT_KEY: &str = "value";

/// Scenario used when the host has none.
pub const DEFAULT_SCENARIO: &str = "default";

static TEMPLATE_FORMATTER: TemplateFormatter = TemplateFormatter;

/// Result of one validation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    /// Whether no errors were produced
    pub valid: bool,
    /// Errors in the order they were produced
    pub errors: Vec<ErrorRecord>,
    /// Transformed value (or the input, where nodes are immutable)
    pub value: Value,
}

impl ValidationOutcome {
    /// Rendered messages in order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// All messages joined into one string, `None` when valid.
    pub fn summary(&self, separator: &str) -> Option<String> {
        if self.valid {
            return None;
        }
        Some(self.messages().join(separator))
    }

    /// Consumes the outcome, returning the resulting value.
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Recursive structure validator.
pub struct Validator<'a> {
    registry: &'a dyn RuleRegistry,
    formatter: &'a dyn MessageFormatter,
}

impl<'a> Validator<'a> {
    /// Creates a validator rendering messages with [`TemplateFormatter`].
    pub fn new(registry: &'a dyn RuleRegistry) -> Self {
        Self {
            registry,
            formatter: &TEMPLATE_FORMATTER,
        }
    }

    /// Replaces the message formatter.
    pub fn with_formatter(mut self, formatter: &'a dyn MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Validates `value` against `schema`, naming the root `"value"`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the schema cannot be executed:
    /// - a reserved persistence-backed rule is invoked
    /// - a rule identifier resolves to nothing
    /// - the schema tree is malformed
    pub fn validate(
        &self,
        value: &Value,
        schema: &SchemaNode,
        scenario: &str,
    ) -> ValidationResult<ValidationOutcome> {
        self.validate_attribute(DEFAULT_ROOT_KEY, value, schema, scenario)
    }

    /// Validates `value` as the attribute `attribute` of a host record.
    ///
    /// `attribute` is the root key handed to predicates and custom rules and
    /// the `{attribute}` of the root node's own messages.
    pub fn validate_attribute(
        &self,
        attribute: &str,
        value: &Value,
        schema: &SchemaNode,
        scenario: &str,
    ) -> ValidationResult<ValidationOutcome> {
        debug!(
            event = %Event::ValidationBegin,
            attribute = attribute,
            scenario = scenario,
            each = schema.each,
            "validation started"
        );

        match self.run(attribute, value, schema, scenario) {
            Ok(outcome) => {
                debug!(
                    event = %Event::ValidationComplete,
                    attribute = attribute,
                    valid = outcome.valid,
                    errors = outcome.errors.len(),
                    "validation finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    event = %Event::ValidationFault,
                    attribute = attribute,
                    code = err.code(),
                    error = %err,
                    "validation aborted"
                );
                Err(err)
            }
        }
    }

    fn run(
        &self,
        attribute: &str,
        value: &Value,
        schema: &SchemaNode,
        scenario: &str,
    ) -> ValidationResult<ValidationOutcome> {
        schema.validate_structure()?;

        let ctx = ValidationContext::new(value, attribute, scenario);
        let mut walker = Walker::new(self.registry, self.formatter);

        let value = match walker.walk(value.clone(), schema, &ctx, attribute)? {
            NodeResult::Rejected { violation, value } => {
                let message = walker.node_message(violation.failure, attribute, &ctx);
                walker.errors.node_error(schema, &ctx.path, violation.kind, message);
                value
            }
            NodeResult::Walked(outcome) => outcome.value,
        };

        let errors = walker.into_errors().into_records();
        Ok(ValidationOutcome {
            valid: errors.is_empty(),
            errors,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardRegistry;
    use crate::schema::RuleEntry;
    use serde_json::json;

    #[test]
    fn test_valid_record() {
        let registry = StandardRegistry::new();
        let schema = SchemaNode::record().field("a", vec![RuleEntry::rule("integer")]);
        let outcome = Validator::new(&registry)
            .validate(&json!({"a": 1}), &schema, DEFAULT_SCENARIO)
            .unwrap();
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.summary("\n"), None);
        assert_eq!(outcome.into_value(), json!({"a": 1}));
    }

    #[test]
    fn test_root_shape_error_uses_attribute() {
        let registry = StandardRegistry::new();
        let schema = SchemaNode::record().field("a", vec![RuleEntry::rule("safe")]);
        let outcome = Validator::new(&registry)
            .validate_attribute("payload", &json!(5), &schema, DEFAULT_SCENARIO)
            .unwrap();
        assert!(!outcome.valid);
        assert_eq!(outcome.messages(), vec!["payload must be a list or a map."]);
        assert_eq!(outcome.value, json!(5));
    }

    #[test]
    fn test_summary_joins_messages() {
        let registry = StandardRegistry::new();
        let schema = SchemaNode::each()
            .stop_on_first_error(false)
            .field("a", vec![RuleEntry::rule("required")]);
        let outcome = Validator::new(&registry)
            .validate(&json!([{}, {}]), &schema, DEFAULT_SCENARIO)
            .unwrap();
        assert_eq!(
            outcome.summary("|").as_deref(),
            Some("[0]a cannot be blank.|[1]a cannot be blank.")
        );
    }

    #[test]
    fn test_structure_fault_aborts() {
        let registry = StandardRegistry::new();
        let schema = SchemaNode::record().min_size(2).max_size(1);
        let err = Validator::new(&registry)
            .validate(&json!({}), &schema, DEFAULT_SCENARIO)
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_INVALID_BOUNDS");
    }

    #[test]
    fn test_outcome_serializes() {
        let registry = StandardRegistry::new();
        let schema = SchemaNode::record().field("a", vec![RuleEntry::rule("required")]);
        let outcome = Validator::new(&registry)
            .validate(&json!({}), &schema, DEFAULT_SCENARIO)
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["valid"], json!(false));
        assert_eq!(json["errors"][0]["kind"], json!("field_rule"));
        assert_eq!(json["value"], json!({"a": null}));
    }
}
