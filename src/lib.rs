//! shapecheck - Recursive rule-chain validation for nested maps and lists of records
//!
//! A [`SchemaNode`](schema::SchemaNode) tree declares, per key, an ordered
//! chain of rules. The [`Validator`](validator::Validator) walks a
//! `serde_json::Value` against it, applying checks, filters and defaults,
//! recursing into nested schemas, and returns validity, path-prefixed
//! messages and the transformed value.

pub mod message;
pub mod observability;
pub mod rules;
pub mod schema;
pub mod validator;
