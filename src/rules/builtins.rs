//! Standard rule catalog
//!
//! Checks return `Err(RuleFailure)` with a template; transforms return the new
//! value. Checks skip empty values unless the entry says otherwise, so
//! `integer` on a missing key passes and `required` is the one place absence
//! is rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::Arc;

use super::context::RuleFailure;
use super::id::RuleId;
use super::registry::Capability;
use crate::schema::RuleOptions;

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?\d+\s*$").expect("integer pattern compiles"));

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?\s*$").expect("number pattern compiles")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?\.)+[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?$",
    )
    .expect("email pattern compiles")
});

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^https?://(([A-Z0-9][A-Z0-9_-]*)(\.[A-Z0-9][A-Z0-9_-]*)+)(?::\d{1,5})?(?:$|[?/#])",
    )
    .expect("url pattern compiles")
});

/// Returns the standard capability for an identifier.
///
/// Reserved and host-defined identifiers have no standard capability.
pub fn capability(id: &RuleId) -> Option<Capability> {
    let cap = match id {
        RuleId::Required => check(required, false),
        RuleId::Safe => check(|_, _| Ok(()), false),
        RuleId::Integer => check(integer, true),
        RuleId::Number => check(number, true),
        RuleId::Boolean => check(boolean, true),
        RuleId::String => check(string, true),
        RuleId::In => check(in_range, true),
        RuleId::Match => check(matches_pattern, true),
        RuleId::Email => check(email, true),
        RuleId::Url => check(url, true),
        RuleId::Ip => check(ip, true),
        RuleId::Default => Capability::Default(Arc::new(|opts: &RuleOptions| {
            opts.param("value").cloned().unwrap_or(Value::Null)
        })),
        RuleId::Trim => Capability::Filter(Arc::new(|value: Value, _: &RuleOptions| trim(value))),
        RuleId::Filter => {
            Capability::Filter(Arc::new(|value: Value, opts: &RuleOptions| {
                match &opts.filter {
                    Some(filter) => filter.apply(value),
                    None => value,
                }
            }))
        }
        RuleId::Unique | RuleId::Exist | RuleId::Named(_) => return None,
    };
    Some(cap)
}

fn check<F>(f: F, skip_on_empty: bool) -> Capability
where
    F: Fn(&Value, &RuleOptions) -> Result<(), RuleFailure> + Send + Sync + 'static,
{
    Capability::Check {
        check: Arc::new(f),
        skip_on_empty,
    }
}

/// Whether a value counts as empty for defaults and skip-on-empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Renders a parameter without JSON string quotes.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn required(value: &Value, _opts: &RuleOptions) -> Result<(), RuleFailure> {
    let blank = match value {
        Value::String(s) => s.trim().is_empty(),
        other => is_empty(other),
    };
    if blank {
        return Err(RuleFailure::new("{attribute} cannot be blank."));
    }
    Ok(())
}

fn trim(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

fn integer(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let parsed: Option<i128> = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) if INTEGER_PATTERN.is_match(s) => s.trim().parse().ok(),
        _ => None,
    };
    let n = parsed.ok_or_else(|| RuleFailure::new("{attribute} must be an integer."))?;

    if let Some(min) = opts.param_i64("min") {
        if n < i128::from(min) {
            return Err(
                RuleFailure::new("{attribute} must be no less than {min}.").with("min", min)
            );
        }
    }
    if let Some(max) = opts.param_i64("max") {
        if n > i128::from(max) {
            return Err(
                RuleFailure::new("{attribute} must be no greater than {max}.").with("max", max)
            );
        }
    }
    Ok(())
}

fn number(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if NUMBER_PATTERN.is_match(s) => s.trim().parse().ok(),
        _ => None,
    };
    let n = parsed.ok_or_else(|| RuleFailure::new("{attribute} must be a number."))?;

    let bound = |name: &str| opts.param(name).map(render).unwrap_or_default();

    if let Some(min) = opts.param_f64("min") {
        if n < min {
            return Err(RuleFailure::new("{attribute} must be no less than {min}.")
                .with("min", bound("min")));
        }
    }
    if let Some(max) = opts.param_f64("max") {
        if n > max {
            return Err(RuleFailure::new("{attribute} must be no greater than {max}.")
                .with("max", bound("max")));
        }
    }
    Ok(())
}

fn boolean(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let ok = match value {
        Value::Bool(_) => true,
        _ if opts.flag("strict") => false,
        Value::Number(n) => matches!(n.as_i64(), Some(0) | Some(1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1" | "true" | "false"),
        _ => false,
    };
    if !ok {
        return Err(RuleFailure::new("{attribute} must be either \"true\" or \"false\"."));
    }
    Ok(())
}

fn string(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let s = value
        .as_str()
        .ok_or_else(|| RuleFailure::new("{attribute} must be a string."))?;
    let len = s.chars().count() as i64;

    if let Some(length) = opts.param_i64("length") {
        if len != length {
            return Err(
                RuleFailure::new("{attribute} should contain {length} characters.")
                    .with("length", length),
            );
        }
    }
    if let Some(min) = opts.param_i64("min") {
        if len < min {
            return Err(
                RuleFailure::new("{attribute} should contain at least {min} characters.")
                    .with("min", min),
            );
        }
    }
    if let Some(max) = opts.param_i64("max") {
        if len > max {
            return Err(
                RuleFailure::new("{attribute} should contain at most {max} characters.")
                    .with("max", max),
            );
        }
    }
    Ok(())
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => a == b,
        _ => render(a) == render(b),
    }
}

fn in_range(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let range = opts.param("range").and_then(Value::as_array);
    let strict = opts.flag("strict");
    let found = range.map_or(false, |items| {
        items
            .iter()
            .any(|item| if strict { item == value } else { loose_eq(item, value) })
    });

    if found == opts.flag("not") {
        return Err(RuleFailure::new("{attribute} is invalid."));
    }
    Ok(())
}

/// Compiles a pattern, accepting `/body/flags` delimiters.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let source = match (pattern.strip_prefix('/'), pattern.rfind('/')) {
        (Some(_), Some(end)) if end > 0 => {
            let body = &pattern[1..end];
            let flags: String = pattern[end + 1..]
                .chars()
                .filter(|c| matches!(c, 'i' | 'm' | 's' | 'x'))
                .collect();
            if flags.is_empty() {
                body.to_string()
            } else {
                format!("(?{}){}", flags, body)
            }
        }
        _ => pattern.to_string(),
    };
    Regex::new(&source)
}

fn matches_pattern(value: &Value, opts: &RuleOptions) -> Result<(), RuleFailure> {
    let invalid = || RuleFailure::new("{attribute} is invalid.");
    let text = match value {
        Value::String(_) | Value::Number(_) => render(value),
        _ => return Err(invalid()),
    };
    let regex = opts
        .param_str("pattern")
        .and_then(|p| compile_pattern(p).ok())
        .ok_or_else(invalid)?;

    if regex.is_match(&text) == opts.flag("not") {
        return Err(invalid());
    }
    Ok(())
}

fn email(value: &Value, _opts: &RuleOptions) -> Result<(), RuleFailure> {
    match value.as_str() {
        Some(s) if EMAIL_PATTERN.is_match(s) => Ok(()),
        _ => Err(RuleFailure::new("{attribute} is not a valid email address.")),
    }
}

fn url(value: &Value, _opts: &RuleOptions) -> Result<(), RuleFailure> {
    match value.as_str() {
        Some(s) if s.len() < 2000 && URL_PATTERN.is_match(s) => Ok(()),
        _ => Err(RuleFailure::new("{attribute} is not a valid URL.")),
    }
}

fn ip(value: &Value, _opts: &RuleOptions) -> Result<(), RuleFailure> {
    match value.as_str().map(|s| s.trim().parse::<IpAddr>()) {
        Some(Ok(_)) => Ok(()),
        _ => Err(RuleFailure::new("{attribute} must be a valid IP address.")),
    }
}
