use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Expected shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Email,
}

impl RuleType {
    /// Name used in messages and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::String => "string",
            RuleType::Number => "number",
            RuleType::Integer => "integer",
            RuleType::Boolean => "boolean",
            RuleType::Array => "array",
            RuleType::Object => "object",
            RuleType::Email => "email",
        }
    }

    /// Returns true if `value` has this shape.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            RuleType::String => value.is_string(),
            RuleType::Number => value.is_number(),
            RuleType::Integer => value.is_i64() || value.is_u64(),
            RuleType::Boolean => value.is_boolean(),
            RuleType::Array => value.is_array(),
            RuleType::Object => value.is_object(),
            RuleType::Email => value.as_str().is_some_and(looks_like_email),
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|part| !part.is_empty())
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A single declarative validation rule.
///
/// All constraints are optional; an empty rule accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Value must be present (not null, not an empty string or array).
    #[serde(default)]
    pub required: bool,
    /// Expected value shape.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RuleType>,
    /// Exact length (strings, arrays) or exact value (numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<f64>,
    /// Lower bound, same interpretation as `len`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, same interpretation as `len`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    /// Reject strings made only of whitespace.
    #[serde(default)]
    pub whitespace: bool,
    /// Replaces the generated message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Rule applied to every element of an array (or member of an object)
    /// value. Element violations are reported at `path.index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_field: Option<Box<Rule>>,
}

impl Rule {
    /// Shorthand for `{ required: true }`.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    /// Shorthand for `{ type: kind }`.
    pub fn of_type(kind: RuleType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Replaces the generated failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the exact length or value.
    pub fn with_len(mut self, len: f64) -> Self {
        self.len = Some(len);
        self
    }

    /// Sets the lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the upper bound.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Restricts the value to `allowed`.
    pub fn with_enum(mut self, allowed: Vec<Value>) -> Self {
        self.one_of = Some(allowed);
        self
    }

    /// Rejects whitespace-only strings.
    pub fn with_whitespace(mut self) -> Self {
        self.whitespace = true;
        self
    }

    /// Sets the rule applied to each element of the value.
    pub fn each(mut self, rule: Rule) -> Self {
        self.default_field = Some(Box::new(rule));
        self
    }

    /// Returns true if this rule declares an `array` type.
    pub fn is_array_rule(&self) -> bool {
        self.kind == Some(RuleType::Array)
    }
}
