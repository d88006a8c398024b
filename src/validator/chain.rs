//! Rule chain execution
//!
//! Declared keys run in schema order, entries in chain order. Every entry sees
//! the record as left by the entries before it, including other keys' chains.

use serde_json::{Map, Value};
use std::mem;
use tracing::trace;

use super::context::{PathSegment, RowIndex, ValidationContext};
use super::errors::{ValidationError, ValidationResult};
use super::gate::{self, GateDecision};
use super::traversal::{NodeResult, Walker};
use crate::observability::Event;
use crate::rules::{is_empty, Capability, CustomRule, FieldErrors, RuleContext, RuleFailure, RuleId};
use crate::schema::{RuleEntry, RuleKind, RuleOptions, SchemaNode};

/// Messages and verdict of all chains of one record.
#[derive(Debug, Default)]
pub(crate) struct ChainReport {
    pub messages: Vec<String>,
    pub failed: bool,
}

/// Verdict of one entry.
#[derive(Debug, Default)]
struct EntryOutcome {
    messages: Vec<String>,
    failed: bool,
}

impl EntryOutcome {
    fn passed() -> Self {
        Self::default()
    }

    fn failed(messages: Vec<String>) -> Self {
        Self {
            messages,
            failed: true,
        }
    }
}

/// Where an entry runs.
#[derive(Clone, Copy)]
struct Frame<'f, 'c> {
    key: &'f str,
    index: Option<&'f RowIndex>,
    ctx: &'f ValidationContext<'c>,
}

impl<'f, 'c> Frame<'f, 'c> {
    fn rule_context<'r>(&'r self, record: &'r Map<String, Value>) -> RuleContext<'r> {
        RuleContext {
            record,
            key: self.key,
            index: self.index,
            root: self.ctx.root,
            root_key: self.ctx.root_key,
            scenario: self.ctx.scenario,
            path: &self.ctx.path,
        }
    }
}

impl<'a> Walker<'a> {
    /// Runs every declared chain against `record`.
    pub(super) fn run_chains(
        &mut self,
        record: &mut Map<String, Value>,
        node: &SchemaNode,
        ctx: &ValidationContext<'_>,
        index: Option<&RowIndex>,
    ) -> ValidationResult<ChainReport> {
        let mut report = ChainReport::default();

        for (key, chain) in &node.rules {
            let frame = Frame { key, index, ctx };
            for entry in chain.entries() {
                let outcome = self.run_entry(record, entry, frame)?;
                report.messages.extend(outcome.messages);
                if outcome.failed {
                    report.failed = true;
                    if node.stop_on_first_error {
                        break;
                    }
                }
            }
        }

        Ok(report)
    }

    fn run_entry(
        &mut self,
        record: &mut Map<String, Value>,
        entry: &RuleEntry,
        frame: Frame<'_, '_>,
    ) -> ValidationResult<EntryOutcome> {
        let decision = gate::evaluate(&entry.options, &frame.rule_context(record));
        if decision != GateDecision::Run {
            trace!(
                event = %Event::RuleSkipped,
                path = %frame.ctx.path,
                key = frame.key,
                gate = decision.as_str(),
                "rule entry gated out"
            );
            return Ok(EntryOutcome::passed());
        }

        match &entry.kind {
            RuleKind::Builtin(id) => self.run_builtin(record, id, &entry.options, frame),
            RuleKind::Custom(rule) => Ok(self.run_custom(record, rule, &entry.options, frame)),
            RuleKind::Nested(child) => self.run_nested(record, child, &entry.options, frame),
        }
    }

    fn run_builtin(
        &mut self,
        record: &mut Map<String, Value>,
        id: &RuleId,
        options: &RuleOptions,
        frame: Frame<'_, '_>,
    ) -> ValidationResult<EntryOutcome> {
        match id {
            RuleId::Unique => {
                return Err(ValidationError::unsupported(
                    id.as_str(),
                    "uniqueness checks need an external data source",
                ))
            }
            RuleId::Exist => {
                return Err(ValidationError::unsupported(
                    id.as_str(),
                    "existence checks need an external data source",
                ))
            }
            _ => {}
        }

        let capability = match self.registry.resolve(id) {
            Some(capability) => capability,
            None => {
                return match id {
                    RuleId::Named(name) => match self.registry.named(name) {
                        Some(rule) => Ok(self.run_custom(record, &rule, options, frame)),
                        None => Err(ValidationError::UnknownRule(name.clone())),
                    },
                    other => Err(ValidationError::UnknownRule(other.to_string())),
                }
            }
        };

        match capability {
            Capability::Check { check, skip_on_empty } => {
                let value = record.get(frame.key).unwrap_or(&Value::Null);
                if options.skip_on_empty.unwrap_or(skip_on_empty) && is_empty(value) {
                    return Ok(EntryOutcome::passed());
                }
                match check(value, options) {
                    Ok(()) => Ok(EntryOutcome::passed()),
                    Err(failure) => {
                        let message = self.field_message(failure, options, frame);
                        Ok(EntryOutcome::failed(vec![message]))
                    }
                }
            }
            Capability::Filter(transform) => {
                if let Some(slot) = record.get_mut(frame.key) {
                    let current = mem::take(slot);
                    *slot = transform(current, options);
                }
                Ok(EntryOutcome::passed())
            }
            Capability::Default(default) => {
                if let Some(slot) = record.get_mut(frame.key) {
                    if is_empty(slot) {
                        *slot = default(options);
                    }
                }
                Ok(EntryOutcome::passed())
            }
        }
    }

    fn run_custom(
        &self,
        record: &Map<String, Value>,
        rule: &CustomRule,
        options: &RuleOptions,
        frame: Frame<'_, '_>,
    ) -> EntryOutcome {
        let mut sink = FieldErrors::new();
        rule.run(&frame.rule_context(record), &mut sink);
        if sink.is_empty() {
            return EntryOutcome::passed();
        }

        let messages = sink
            .into_failures()
            .into_iter()
            .map(|failure| self.field_message(failure, options, frame))
            .collect();
        EntryOutcome::failed(messages)
    }

    fn run_nested(
        &mut self,
        record: &mut Map<String, Value>,
        child: &SchemaNode,
        options: &RuleOptions,
        frame: Frame<'_, '_>,
    ) -> ValidationResult<EntryOutcome> {
        let current = record.get_mut(frame.key).map(mem::take).unwrap_or(Value::Null);
        let child_ctx = frame.ctx.child(PathSegment::Key(frame.key.to_string()));

        let (value, outcome) = match self.walk(current, child, &child_ctx, frame.key)? {
            NodeResult::Rejected { violation, value } => {
                let message = self.field_message(violation.failure, options, frame);
                (value, EntryOutcome::failed(vec![message]))
            }
            NodeResult::Walked(walked) => {
                let outcome = if walked.failed {
                    EntryOutcome::failed(Vec::new())
                } else {
                    EntryOutcome::passed()
                };
                (walked.value, outcome)
            }
        };

        if let Some(slot) = record.get_mut(frame.key) {
            *slot = value;
        }
        Ok(outcome)
    }

    /// Renders a field failure, honoring the entry's message override.
    fn field_message(
        &self,
        failure: RuleFailure,
        options: &RuleOptions,
        frame: Frame<'_, '_>,
    ) -> String {
        let RuleFailure { template, params } = failure;
        let template = options.message.as_deref().unwrap_or(&template);
        self.render(template, params, frame.key, frame.ctx)
    }
}
