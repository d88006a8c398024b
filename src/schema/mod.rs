//! Schema subsystem
//!
//! Schemas are configuration: built in code with the [`SchemaNode`] builders
//! or loaded from JSON documents by [`SchemaLoader`]. Once built a tree is
//! never mutated.
//!
//! # Design Principles
//!
//! - Declared keys are exactly the keys a record may carry
//! - Chains are ordered and their order is observable
//! - Structural problems are rejected before any value is touched

mod definition;
mod errors;
mod loader;
mod types;

pub use definition::{MessagesDef, RuleDef, RuleSpec, SchemaDef, NESTED_RULE};
pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{
    NodeMessages, RuleChain, RuleEntry, RuleKind, RuleOptions, SchemaNode, NOT_CONTAINER_MESSAGE,
    TOO_LARGE_MESSAGE, TOO_SMALL_MESSAGE, UNEXPECTED_ITEMS_MESSAGE,
};
