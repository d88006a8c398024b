//! Message formatting for diagnostics
//!
//! The engine never renders text on its own. Every message is a template plus
//! a parameter map handed to a [`MessageFormatter`]. Translation or label
//! generation belongs to the formatter implementation.
//!
//! Reserved parameters supplied by the engine:
//! - `attribute`: the field (or node) name the message is about
//! - `keyPath`: the rendered structural path, e.g. `[foo][1]`
//! - `min` / `max` / `count`: size and bound violations
//! - `items`: comma-joined unexpected keys

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern compiles"));

/// Parameters substituted into a message template.
pub type MessageParams = BTreeMap<String, String>;

/// Renders a template with its parameters.
pub trait MessageFormatter: Send + Sync {
    /// Returns the rendered message.
    fn format(&self, template: &str, params: &MessageParams) -> String;
}

/// Formatter that replaces `{name}` placeholders with parameter values.
///
/// Unknown placeholders are left verbatim, including their braces.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFormatter;

impl MessageFormatter for TemplateFormatter {
    fn format(&self, template: &str, params: &MessageParams) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Builds a parameter map from string pairs.
pub fn params<I, K, V>(pairs: I) -> MessageParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_replaced() {
        let out = TemplateFormatter.format(
            "{attribute} must be no less than {min}.",
            &params([("attribute", "x"), ("min", "5")]),
        );
        assert_eq!(out, "x must be no less than 5.");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let out = TemplateFormatter.format("{attribute} is {odd}", &params([("attribute", "y")]));
        assert_eq!(out, "y is {odd}");
    }

    #[test]
    fn test_unclosed_brace_kept() {
        let out = TemplateFormatter.format("broken {attribute", &params([("attribute", "y")]));
        assert_eq!(out, "broken {attribute");
    }

    #[test]
    fn test_non_word_braces_kept() {
        let out = TemplateFormatter.format(
            "{a b} {} {attribute}",
            &params([("attribute", "y"), ("a b", "no")]),
        );
        assert_eq!(out, "{a b} {} y");
    }

    #[test]
    fn test_values_not_rescanned() {
        let out = TemplateFormatter.format(
            "{attribute}",
            &params([("attribute", "{min}"), ("min", "1")]),
        );
        assert_eq!(out, "{min}");
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(TemplateFormatter.format("", &MessageParams::new()), "");
    }
}
