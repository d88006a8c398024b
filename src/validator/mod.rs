//! Recursive structure validation engine
//!
//! Validates (and optionally transforms) nested maps and sequences against a
//! [`SchemaNode`](crate::schema::SchemaNode) tree.
//!
//! # Pipeline
//!
//! - Size/shape gate: non-containers and out-of-bounds sizes reject the node
//! - Key reconciliation: undeclared keys reject the record, missing keys become `null`
//! - Rule chains: declared keys in order, entries in order, gated by scenario then predicate
//! - Traversal: record mode runs one record, each mode runs every row
//! - Aggregation: compact or exploded messages, optionally path-prefixed
//!
//! Reserved persistence-backed rules abort the whole call with
//! [`ValidationError::Unsupported`].

mod chain;
mod collector;
mod context;
mod engine;
mod errors;
mod gate;
mod reconcile;
mod shape;
mod traversal;

pub use collector::{ErrorKind, ErrorRecord};
pub use context::{KeyPath, PathSegment, RowIndex, ValidationContext};
pub use engine::{ValidationOutcome, Validator, DEFAULT_ROOT_KEY, DEFAULT_SCENARIO};
pub use errors::{ValidationError, ValidationResult};
