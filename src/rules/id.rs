//! Rule identifiers
//!
//! The standard catalog is a closed set. Anything else is a host-defined
//! identifier, resolved through the registry at dispatch time.

use std::fmt;
use std::str::FromStr;

/// Identifier of a registry-dispatched rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleId {
    /// Value must not be empty
    Required,
    /// Inject a value when the field is empty
    Default,
    /// Trim surrounding whitespace from strings
    Trim,
    /// Apply the entry's filter closure
    Filter,
    /// Accept anything; declares the key
    Safe,
    /// Integer with optional bounds
    Integer,
    /// Number with optional bounds
    Number,
    /// Boolean-like value
    Boolean,
    /// String with optional length bounds
    String,
    /// Membership in a range of allowed values
    In,
    /// Regular expression match
    Match,
    /// Email address format
    Email,
    /// URL format
    Url,
    /// IPv4 or IPv6 address
    Ip,
    /// Uniqueness against an external store (reserved, never executed)
    Unique,
    /// Existence against an external store (reserved, never executed)
    Exist,
    /// Host-defined identifier
    Named(String),
}

impl RuleId {
    /// Returns the textual identifier.
    pub fn as_str(&self) -> &str {
        match self {
            RuleId::Required => "required",
            RuleId::Default => "default",
            RuleId::Trim => "trim",
            RuleId::Filter => "filter",
            RuleId::Safe => "safe",
            RuleId::Integer => "integer",
            RuleId::Number => "number",
            RuleId::Boolean => "boolean",
            RuleId::String => "string",
            RuleId::In => "in",
            RuleId::Match => "match",
            RuleId::Email => "email",
            RuleId::Url => "url",
            RuleId::Ip => "ip",
            RuleId::Unique => "unique",
            RuleId::Exist => "exist",
            RuleId::Named(name) => name,
        }
    }

    /// Whether the identifier denotes a persistence-backed check.
    pub fn is_reserved(&self) -> bool {
        matches!(self, RuleId::Unique | RuleId::Exist)
    }
}

impl FromStr for RuleId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "required" => RuleId::Required,
            "default" => RuleId::Default,
            "trim" => RuleId::Trim,
            "filter" => RuleId::Filter,
            "safe" => RuleId::Safe,
            "integer" => RuleId::Integer,
            "number" => RuleId::Number,
            "boolean" => RuleId::Boolean,
            "string" => RuleId::String,
            "in" => RuleId::In,
            "match" => RuleId::Match,
            "email" => RuleId::Email,
            "url" => RuleId::Url,
            "ip" => RuleId::Ip,
            "unique" => RuleId::Unique,
            "exist" => RuleId::Exist,
            other => RuleId::Named(other.to_string()),
        })
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ids_parse() {
        assert_eq!(RuleId::from("required"), RuleId::Required);
        assert_eq!(RuleId::from("match"), RuleId::Match);
        assert_eq!(RuleId::from("exist"), RuleId::Exist);
    }

    #[test]
    fn test_unknown_id_is_named() {
        assert_eq!(RuleId::from("checkOwner"), RuleId::Named("checkOwner".into()));
        assert_eq!(RuleId::from("checkOwner").as_str(), "checkOwner");
    }

    #[test]
    fn test_reserved_ids() {
        assert!(RuleId::Unique.is_reserved());
        assert!(RuleId::Exist.is_reserved());
        assert!(!RuleId::Required.is_reserved());
        assert!(!RuleId::Named("unique_name".into()).is_reserved());
    }
}
