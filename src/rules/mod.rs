//! Rule catalog, registry and the context custom logic runs in
//!
//! Rules are dispatched by [`RuleId`] through a [`RuleRegistry`] supplied by the
//! caller. [`StandardRegistry`] carries the standard catalog and accepts host
//! registrations of checks, rules, predicates and filters.

mod builtins;
mod context;
mod id;
mod registry;

pub use builtins::{compile_pattern, is_empty, render};
pub use context::{CustomRule, FieldErrors, Predicate, RuleContext, RuleFailure, ValueFilter};
pub use id::RuleId;
pub use registry::{Capability, CheckFn, DefaultFn, RuleRegistry, StandardRegistry, TransformFn};
