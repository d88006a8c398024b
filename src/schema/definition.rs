//! Declarative schema documents
//!
//! JSON shape of a schema tree. A rule is either a bare identifier or an
//! object carrying the identifier and its options:
//!
//! ```json
//! {
//!   "name": "orders",
//!   "each": true,
//!   "stop_on_first_error": false,
//!   "rules": {
//!     "id":    ["required", {"rule": "integer", "min": 1}],
//!     "note":  [{"rule": "trim"}, {"rule": "string", "max": 20, "on": ["update"]}],
//!     "lines": [{"rule": "nested", "schema": {"each": true, "rules": {"sku": ["required"]}}}]
//!   }
//! }
//! ```
//!
//! Named `when` predicates and `filter` transforms, and host-defined rule
//! identifiers, are resolved through a [`RuleRegistry`] at compile time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::errors::{SchemaError, SchemaResult};
use super::types::{RuleEntry, RuleKind, RuleOptions, SchemaNode};
use crate::rules::{RuleId, RuleRegistry};

/// Identifier marking a nested schema entry.
pub const NESTED_RULE: &str = "nested";

/// Serialized schema node. Unknown settings are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    /// Registry name; the file stem is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub each: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_first_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compact_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_separator: Option<String>,
    #[serde(default)]
    pub messages: MessagesDef,
    #[serde(default)]
    pub rules: IndexMap<String, Vec<RuleDef>>,
}

/// Node message overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessagesDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub too_large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_items: Option<String>,
}

/// Serialized rule entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDef {
    /// Bare identifier, e.g. `"required"`
    Id(String),
    /// Identifier with options
    Spec(RuleSpec),
}

/// Rule identifier with options. Unrecognized fields become rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub except: Vec<String>,
    /// Name of a registered predicate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_on_empty: Option<bool>,
    /// Name of a registered filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Nested schema for `"rule": "nested"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<SchemaDef>>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl SchemaDef {
    /// Compiles the document into a schema tree and checks its structure.
    pub fn compile(&self, registry: &dyn RuleRegistry) -> SchemaResult<SchemaNode> {
        let node = self.compile_at(registry, "")?;
        node.validate_structure()?;
        Ok(node)
    }

    fn compile_at(
        &self,
        registry: &dyn RuleRegistry,
        location: &str,
    ) -> SchemaResult<SchemaNode> {
        let mut node = if self.each {
            SchemaNode::each()
        } else {
            SchemaNode::record()
        };
        node.min_size = self.min_size;
        node.max_size = self.max_size;
        if let Some(mutable) = self.mutable {
            node.mutable = mutable;
        }
        if let Some(stop) = self.stop_on_first_error {
            node.stop_on_first_error = stop;
        }
        if let Some(compact) = self.compact_errors {
            node.compact_errors = compact;
        }
        if let Some(prefix) = self.prefix_errors {
            node.prefix_errors = prefix;
        }
        if let Some(separator) = &self.error_separator {
            node.error_separator = separator.clone();
        }

        let messages = &self.messages;
        if let Some(t) = &messages.not_container {
            node.messages.not_container = t.clone();
        }
        if let Some(t) = &messages.too_small {
            node.messages.too_small = t.clone();
        }
        if let Some(t) = &messages.too_large {
            node.messages.too_large = t.clone();
        }
        if let Some(t) = &messages.unexpected_items {
            node.messages.unexpected_items = t.clone();
        }

        for (key, defs) in &self.rules {
            let key_location = format!("{}[{}]", location, key);
            let chain = defs
                .iter()
                .map(|def| def.compile(registry, &key_location))
                .collect::<SchemaResult<Vec<_>>>()?;
            node = node.field(key.clone(), chain);
        }

        Ok(node)
    }
}

impl RuleDef {
    fn compile(&self, registry: &dyn RuleRegistry, location: &str) -> SchemaResult<RuleEntry> {
        let spec = match self {
            RuleDef::Id(id) if id == NESTED_RULE => {
                return Err(SchemaError::MissingOption {
                    rule: NESTED_RULE.to_string(),
                    option: "schema".to_string(),
                    location: location.to_string(),
                })
            }
            RuleDef::Id(id) => return Ok(RuleEntry::rule(id.as_str())),
            RuleDef::Spec(spec) => spec,
        };

        let kind = if spec.rule == NESTED_RULE {
            let child = spec.schema.as_ref().ok_or_else(|| SchemaError::MissingOption {
                rule: NESTED_RULE.to_string(),
                option: "schema".to_string(),
                location: location.to_string(),
            })?;
            RuleKind::Nested(Arc::new(child.compile_at(registry, location)?))
        } else if spec.schema.is_some() {
            return Err(SchemaError::InvalidOption {
                rule: spec.rule.clone(),
                option: "schema".to_string(),
                location: location.to_string(),
                reason: format!("only '{}' rules take a schema", NESTED_RULE),
            });
        } else {
            RuleKind::Builtin(RuleId::from(spec.rule.as_str()))
        };

        let when = spec
            .when
            .as_deref()
            .map(|name| {
                registry
                    .predicate(name)
                    .ok_or_else(|| SchemaError::UnknownPredicate(name.to_string()))
            })
            .transpose()?;

        let filter = spec
            .filter
            .as_deref()
            .map(|name| {
                registry
                    .filter(name)
                    .ok_or_else(|| SchemaError::UnknownFilter(name.to_string()))
            })
            .transpose()?;

        Ok(RuleEntry {
            kind,
            options: RuleOptions {
                on: spec.on.clone(),
                except: spec.except.clone(),
                when,
                message: spec.message.clone(),
                skip_on_empty: spec.skip_on_empty,
                filter,
                params: spec.params.clone(),
            },
        })
    }
}
