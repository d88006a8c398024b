//! Container traversal
//!
//! Depth-first walk over one node: gate, then either a single record or every
//! row in order. Each record runs reconciliation and its chains, then flushes
//! its messages to the collector under the node's aggregation policy.

use serde_json::{Map, Value};
use tracing::debug;

use super::collector::{ErrorCollector, ErrorKind};
use super::context::{RowIndex, ValidationContext};
use super::errors::ValidationResult;
use super::reconcile;
use super::shape::{self, Violation};
use crate::message::{MessageFormatter, MessageParams};
use crate::observability::Event;
use crate::rules::{RuleFailure, RuleRegistry};
use crate::schema::SchemaNode;

/// Result of walking a node that passed its gate.
#[derive(Debug)]
pub(crate) struct NodeOutcome {
    /// Transformed value when the node is mutable, the input otherwise
    pub value: Value,
    /// Whether the node or any of its rows produced an error
    pub failed: bool,
}

/// Result of walking any node.
#[derive(Debug)]
pub(crate) enum NodeResult {
    /// Gate rejected the node; the value is handed back untouched
    Rejected { violation: Violation, value: Value },
    /// Node was walked
    Walked(NodeOutcome),
}

/// One top-level call's walk state.
pub(crate) struct Walker<'a> {
    pub(super) registry: &'a dyn RuleRegistry,
    pub(super) formatter: &'a dyn MessageFormatter,
    pub(super) errors: ErrorCollector,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(registry: &'a dyn RuleRegistry, formatter: &'a dyn MessageFormatter) -> Self {
        Self {
            registry,
            formatter,
            errors: ErrorCollector::new(),
        }
    }

    /// Walks `value` against `node`. `attribute` names the node in messages.
    pub(crate) fn walk(
        &mut self,
        value: Value,
        node: &SchemaNode,
        ctx: &ValidationContext<'_>,
        attribute: &str,
    ) -> ValidationResult<NodeResult> {
        if let Err(violation) = shape::inspect(&value, node) {
            debug!(
                event = %Event::NodeRejected,
                path = %ctx.path,
                kind = %violation.kind,
                "node failed size/shape gate"
            );
            return Ok(NodeResult::Rejected { violation, value });
        }

        let outcome = if node.each {
            self.walk_rows(value, node, ctx, attribute)?
        } else {
            self.walk_record(value, node, ctx, attribute)?
        };
        Ok(NodeResult::Walked(outcome))
    }

    fn walk_record(
        &mut self,
        value: Value,
        node: &SchemaNode,
        ctx: &ValidationContext<'_>,
        attribute: &str,
    ) -> ValidationResult<NodeOutcome> {
        let original = (!node.mutable).then(|| value.clone());
        let was_sequence = value.is_array();

        let (value, failed) = match shape::into_record(value) {
            Ok(mut record) => {
                let failed = self.run_record(&mut record, node, ctx, attribute, None)?;
                (shape::from_record(record, was_sequence), failed)
            }
            Err(value) => (value, false),
        };

        Ok(NodeOutcome {
            value: original.unwrap_or(value),
            failed,
        })
    }

    fn walk_rows(
        &mut self,
        value: Value,
        node: &SchemaNode,
        ctx: &ValidationContext<'_>,
        attribute: &str,
    ) -> ValidationResult<NodeOutcome> {
        let original = (!node.mutable).then(|| value.clone());

        let (rows, is_map): (Vec<(RowIndex, Value)>, bool) = match value {
            Value::Array(items) => (
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, row)| (RowIndex::Position(i), row))
                    .collect(),
                false,
            ),
            Value::Object(map) => (
                map.into_iter().map(|(k, row)| (RowIndex::Key(k), row)).collect(),
                true,
            ),
            other => {
                return Ok(NodeOutcome {
                    value: other,
                    failed: false,
                })
            }
        };

        let total = rows.len();
        let mut failed = false;
        let mut stopped = false;
        let mut out: Vec<(RowIndex, Value)> = Vec::with_capacity(total);

        for (position, (index, row)) in rows.into_iter().enumerate() {
            if stopped {
                out.push((index, row));
                continue;
            }

            let row_ctx = ctx.child(index.segment());
            let was_sequence = row.is_array();
            let (row, row_failed) = match shape::into_record(row) {
                Ok(mut record) => {
                    let row_failed =
                        self.run_record(&mut record, node, &row_ctx, attribute, Some(&index))?;
                    (shape::from_record(record, was_sequence), row_failed)
                }
                Err(scalar) => {
                    debug!(
                        event = %Event::RowRejected,
                        path = %row_ctx.path,
                        "row is not a container"
                    );
                    let message = self.node_message(
                        RuleFailure::new(node.messages.not_container.as_str()),
                        attribute,
                        &row_ctx,
                    );
                    self.errors.node_error(node, &row_ctx.path, ErrorKind::Shape, message);
                    (scalar, true)
                }
            };

            out.push((index, row));
            if row_failed {
                failed = true;
                if node.stop_on_first_error {
                    stopped = true;
                    if position + 1 < total {
                        debug!(
                            event = %Event::RowsStopped,
                            path = %row_ctx.path,
                            remaining = total - position - 1,
                            "stopping after first invalid row"
                        );
                    }
                }
            }
        }

        let value = if is_map {
            Value::Object(
                out.into_iter()
                    .map(|(index, row)| (index.to_string(), row))
                    .collect::<Map<String, Value>>(),
            )
        } else {
            Value::Array(out.into_iter().map(|(_, row)| row).collect())
        };

        Ok(NodeOutcome {
            value: original.unwrap_or(value),
            failed,
        })
    }

    /// Reconciles one record, runs its chains and flushes its messages.
    ///
    /// Returns whether the record is invalid.
    fn run_record(
        &mut self,
        record: &mut Map<String, Value>,
        node: &SchemaNode,
        ctx: &ValidationContext<'_>,
        attribute: &str,
        index: Option<&RowIndex>,
    ) -> ValidationResult<bool> {
        let unexpected = reconcile::unexpected_keys(record, node);
        if !unexpected.is_empty() {
            let items = unexpected.join(",");
            debug!(
                event = %Event::KeysUnexpected,
                path = %ctx.path,
                items = %items,
                "record has undeclared keys"
            );
            let message = self.node_message(
                RuleFailure::new(node.messages.unexpected_items.as_str()).with("items", &items),
                attribute,
                ctx,
            );
            self.errors.node_error(node, &ctx.path, ErrorKind::UnexpectedKeys, message);
            return Ok(true);
        }

        reconcile::fill_missing(record, node);

        let report = self.run_chains(record, node, ctx, index)?;
        self.errors.field_errors(node, &ctx.path, report.messages);
        Ok(report.failed)
    }

    /// Renders a node-level message.
    pub(super) fn node_message(
        &self,
        failure: RuleFailure,
        attribute: &str,
        ctx: &ValidationContext<'_>,
    ) -> String {
        self.render(&failure.template, failure.params, attribute, ctx)
    }

    /// Renders a template with the engine's reserved parameters added.
    pub(super) fn render(
        &self,
        template: &str,
        mut params: MessageParams,
        attribute: &str,
        ctx: &ValidationContext<'_>,
    ) -> String {
        params
            .entry("attribute".to_string())
            .or_insert_with(|| attribute.to_string());
        params.insert("keyPath".to_string(), ctx.path.to_string());
        self.formatter.format(template, &params)
    }

    pub(crate) fn into_errors(self) -> ErrorCollector {
        self.errors
    }
}
