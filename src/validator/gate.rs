//! Rule entry gating
//!
//! `except` is checked first, then `on`, and only then the `when` predicate.
//! A predicate is never invoked for an entry its scenario lists exclude.

use crate::rules::RuleContext;
use crate::schema::RuleOptions;

/// Outcome of gating one rule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateDecision {
    /// Entry executes
    Run,
    /// Scenario is listed in `except`
    Excepted,
    /// `on` is set and does not list the scenario
    NotOn,
    /// `when` returned false
    Predicate,
}

impl GateDecision {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Run => "run",
            GateDecision::Excepted => "except",
            GateDecision::NotOn => "on",
            GateDecision::Predicate => "when",
        }
    }
}

/// Pure set-membership scenario check.
pub(crate) fn scenario_gate(options: &RuleOptions, scenario: &str) -> GateDecision {
    if options.except.iter().any(|s| s == scenario) {
        return GateDecision::Excepted;
    }
    if !options.on.is_empty() && !options.on.iter().any(|s| s == scenario) {
        return GateDecision::NotOn;
    }
    GateDecision::Run
}

/// Full gate: scenario lists, then predicate.
pub(crate) fn evaluate(options: &RuleOptions, ctx: &RuleContext<'_>) -> GateDecision {
    match scenario_gate(options, ctx.scenario) {
        GateDecision::Run => {}
        skipped => return skipped,
    }
    match &options.when {
        Some(predicate) if !predicate.test(ctx) => GateDecision::Predicate,
        _ => GateDecision::Run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleEntry;
    use crate::validator::KeyPath;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn with_ctx<R>(scenario: &str, f: impl FnOnce(&RuleContext<'_>) -> R) -> R {
        let record: Map<String, Value> = Map::new();
        let root = json!({});
        let path = KeyPath::root();
        let ctx = RuleContext {
            record: &record,
            key: "a",
            index: None,
            root: &root,
            root_key: "value",
            scenario,
            path: &path,
        };
        f(&ctx)
    }

    #[test]
    fn test_no_lists_always_run() {
        let entry = RuleEntry::rule("safe");
        assert_eq!(scenario_gate(&entry.options, "anything"), GateDecision::Run);
    }

    #[test]
    fn test_on_limits_scenarios() {
        let entry = RuleEntry::rule("safe").on(["A"]);
        assert_eq!(scenario_gate(&entry.options, "A"), GateDecision::Run);
        assert_eq!(scenario_gate(&entry.options, "B"), GateDecision::NotOn);
    }

    #[test]
    fn test_except_wins_over_on() {
        let entry = RuleEntry::rule("safe").on(["A"]).except(["A"]);
        assert_eq!(scenario_gate(&entry.options, "A"), GateDecision::Excepted);
        let entry = RuleEntry::rule("safe").except(["A"]);
        assert_eq!(scenario_gate(&entry.options, "B"), GateDecision::Run);
    }

    #[test]
    fn test_predicate_not_called_when_scenario_skips() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = RuleEntry::rule("safe").on(["A"]).when(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let decision = with_ctx("B", |ctx| evaluate(&entry.options, ctx));
        assert_eq!(decision, GateDecision::NotOn);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let decision = with_ctx("A", |ctx| evaluate(&entry.options, ctx));
        assert_eq!(decision, GateDecision::Run);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_false_predicate_skips() {
        let entry = RuleEntry::rule("safe").when(|ctx| ctx.key == "other");
        let decision = with_ctx("default", |ctx| evaluate(&entry.options, ctx));
        assert_eq!(decision, GateDecision::Predicate);
        assert_eq!(decision.as_str(), "when");
    }
}
