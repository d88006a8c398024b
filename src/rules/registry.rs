//! Rule registry
//!
//! The engine dispatches by identifier only. A registry maps identifiers to
//! capabilities and resolves the names a declarative schema refers to
//! (host-defined rules, `when` predicates, filters).

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builtins;
use super::context::{CustomRule, FieldErrors, Predicate, RuleContext, RuleFailure, ValueFilter};
use super::id::RuleId;
use crate::schema::RuleOptions;

/// Pure verdict over the current field value.
pub type CheckFn = Arc<dyn Fn(&Value, &RuleOptions) -> Result<(), RuleFailure> + Send + Sync>;

/// Transform of the current field value.
pub type TransformFn = Arc<dyn Fn(Value, &RuleOptions) -> Value + Send + Sync>;

/// Value injected into an empty field.
pub type DefaultFn = Arc<dyn Fn(&RuleOptions) -> Value + Send + Sync>;

/// What a registry identifier resolves to.
#[derive(Clone)]
pub enum Capability {
    /// Pass/fail check
    Check {
        /// The check
        check: CheckFn,
        /// Whether empty values bypass the check by default
        skip_on_empty: bool,
    },
    /// Always-applied transform (trim, filter)
    Filter(TransformFn),
    /// Applied only when the field is empty
    Default(DefaultFn),
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Check { skip_on_empty, .. } => f
                .debug_struct("Check")
                .field("skip_on_empty", skip_on_empty)
                .finish_non_exhaustive(),
            Capability::Filter(_) => f.write_str("Filter(..)"),
            Capability::Default(_) => f.write_str("Default(..)"),
        }
    }
}

/// Source of rule capabilities and named schema references.
pub trait RuleRegistry: Send + Sync {
    /// Resolves a registry-dispatched identifier.
    fn resolve(&self, id: &RuleId) -> Option<Capability>;

    /// Resolves a host-defined rule run with the explicit rule context.
    fn named(&self, _name: &str) -> Option<CustomRule> {
        None
    }

    /// Resolves a named `when` predicate.
    fn predicate(&self, _name: &str) -> Option<Predicate> {
        None
    }

    /// Resolves a named transform for the `filter` rule.
    fn filter(&self, _name: &str) -> Option<ValueFilter> {
        None
    }
}

/// Registry serving the standard catalog plus host registrations.
///
/// Host capabilities registered under a standard identifier take precedence
/// over the catalog entry.
#[derive(Debug, Clone, Default)]
pub struct StandardRegistry {
    capabilities: HashMap<String, Capability>,
    rules: HashMap<String, CustomRule>,
    predicates: HashMap<String, Predicate>,
    filters: HashMap<String, ValueFilter>,
}

impl StandardRegistry {
    /// Creates a registry with only the standard catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under an identifier.
    pub fn with_capability(mut self, id: impl Into<String>, capability: Capability) -> Self {
        self.capabilities.insert(id.into(), capability);
        self
    }

    /// Registers a pass/fail check under an identifier.
    pub fn with_check<F>(self, id: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &RuleOptions) -> Result<(), RuleFailure> + Send + Sync + 'static,
    {
        self.with_capability(
            id,
            Capability::Check {
                check: Arc::new(check),
                skip_on_empty: true,
            },
        )
    }

    /// Registers a host-defined rule.
    pub fn with_rule<F>(mut self, name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &mut FieldErrors) + Send + Sync + 'static,
    {
        self.rules.insert(name.into(), CustomRule::new(rule));
        self
    }

    /// Registers a named predicate.
    pub fn with_predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Predicate::new(predicate));
        self
    }

    /// Registers a named filter.
    pub fn with_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), ValueFilter::new(filter));
        self
    }
}

impl RuleRegistry for StandardRegistry {
    fn resolve(&self, id: &RuleId) -> Option<Capability> {
        if id.is_reserved() {
            return None;
        }
        self.capabilities
            .get(id.as_str())
            .cloned()
            .or_else(|| builtins::capability(id))
    }

    fn named(&self, name: &str) -> Option<CustomRule> {
        self.rules.get(name).cloned()
    }

    fn predicate(&self, name: &str) -> Option<Predicate> {
        self.predicates.get(name).cloned()
    }

    fn filter(&self, name: &str) -> Option<ValueFilter> {
        self.filters.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_catalog_resolves() {
        let registry = StandardRegistry::new();
        assert!(matches!(
            registry.resolve(&RuleId::Required),
            Some(Capability::Check { skip_on_empty: false, .. })
        ));
        assert!(matches!(registry.resolve(&RuleId::Trim), Some(Capability::Filter(_))));
        assert!(matches!(registry.resolve(&RuleId::Default), Some(Capability::Default(_))));
        assert!(registry.resolve(&RuleId::Named("nope".into())).is_none());
    }

    #[test]
    fn test_reserved_never_resolve() {
        let registry = StandardRegistry::new().with_check("unique", |_, _| Ok(()));
        assert!(registry.resolve(&RuleId::Unique).is_none());
    }

    #[test]
    fn test_host_check_resolves_by_name() {
        let registry = StandardRegistry::new().with_check("even", |v: &Value, _: &RuleOptions| {
            if v.as_i64().map_or(false, |n| n % 2 == 0) {
                Ok(())
            } else {
                Err(RuleFailure::new("{attribute} must be even."))
            }
        });
        match registry.resolve(&RuleId::from("even")) {
            Some(Capability::Check { check, .. }) => {
                assert!(check(&json!(2), &RuleOptions::default()).is_ok());
                assert!(check(&json!(3), &RuleOptions::default()).is_err());
            }
            other => panic!("unexpected capability: {:?}", other),
        }
    }

    #[test]
    fn test_host_override_takes_precedence() {
        let registry = StandardRegistry::new().with_check("email", |_, _| Ok(()));
        match registry.resolve(&RuleId::Email) {
            Some(Capability::Check { check, .. }) => {
                assert!(check(&json!("not an email"), &RuleOptions::default()).is_ok());
            }
            other => panic!("unexpected capability: {:?}", other),
        }
    }

    #[test]
    fn test_named_references() {
        let registry = StandardRegistry::new()
            .with_rule("owner", |_, errors| errors.add("no"))
            .with_predicate("always", |_| true)
            .with_filter("double", |v| json!(v.as_i64().unwrap_or(0) * 2));
        assert!(registry.named("owner").is_some());
        assert!(registry.predicate("always").is_some());
        assert!(registry.filter("double").is_some());
        assert!(registry.named("missing").is_none());
    }
}
