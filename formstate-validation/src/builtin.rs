//! Built-in validator for the declarative rule kinds in [`Rule`].

use crate::messages::{RangeMessages, ValidateMessages};
use crate::rule::{Rule, RuleType};
use crate::validator::{RuleValidator, ValidationRequest};
use crate::violation::Violation;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Checks `required`, `type`, `enum`, `whitespace`, `len`/`min`/`max` and
/// per-element `default_field` rules without suspending.
///
/// Each rule reports at most one violation for the value it checks (the
/// first failing constraint). Element rules report one violation per
/// failing element, at `path.index`.
#[derive(Debug, Clone, Default)]
pub struct RuleSetValidator {
    messages: ValidateMessages,
}

impl RuleSetValidator {
    /// Uses the default message templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `messages` whenever a request does not carry its own templates.
    pub fn with_messages(messages: ValidateMessages) -> Self {
        Self { messages }
    }

    /// Validates one field synchronously.
    pub fn check_field(
        &self,
        path: &str,
        value: &Value,
        rules: &[Rule],
        stop_at_first: bool,
    ) -> Vec<Violation> {
        check_field(path, value, rules, stop_at_first, &self.messages)
    }
}

#[async_trait]
impl RuleValidator for RuleSetValidator {
    async fn validate(&self, request: ValidationRequest) -> Vec<Violation> {
        let messages = request.options.messages.as_ref().unwrap_or(&self.messages);
        let mut violations = Vec::new();
        for (path, rules) in &request.rules {
            let value = request.values.get(path).unwrap_or(&Value::Null);
            let stop_at_first = request.options.first_fields.applies_to(path);
            violations.extend(check_field(path, value, rules, stop_at_first, messages));
        }
        debug!(
            fields = request.rules.len(),
            violations = violations.len(),
            "rule set validated"
        );
        violations
    }
}

fn check_field(
    path: &str,
    value: &Value,
    rules: &[Rule],
    stop_at_first: bool,
    messages: &ValidateMessages,
) -> Vec<Violation> {
    let mut out = Vec::new();
    for rule in rules {
        let found = check_rule(path, value, rule, messages);
        let failed = !found.is_empty();
        out.extend(found);
        if stop_at_first && failed {
            break;
        }
    }
    out
}

fn check_rule(path: &str, value: &Value, rule: &Rule, messages: &ValidateMessages) -> Vec<Violation> {
    if let Some(violation) = first_failure(path, value, rule, messages) {
        return vec![violation];
    }
    match (rule.default_field.as_deref(), value) {
        (Some(each), Value::Array(items)) => items
            .iter()
            .enumerate()
            .flat_map(|(i, item)| check_rule(&format!("{path}.{i}"), item, each, messages))
            .collect(),
        (Some(each), Value::Object(members)) => members
            .iter()
            .flat_map(|(key, item)| check_rule(&format!("{path}.{key}"), item, each, messages))
            .collect(),
        _ => Vec::new(),
    }
}

fn first_failure(
    path: &str,
    value: &Value,
    rule: &Rule,
    messages: &ValidateMessages,
) -> Option<Violation> {
    let fail = |kind: &str, generated: String| {
        let message = rule.message.clone().unwrap_or(generated);
        Some(Violation::new(path, message).with_kind(kind))
    };

    if is_empty(value) {
        if rule.required {
            return fail("required", ValidateMessages::format(&messages.required, &[path]));
        }
        // Optional and absent: nothing else applies.
        return None;
    }

    if rule.whitespace && value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return fail("whitespace", ValidateMessages::format(&messages.whitespace, &[path]));
    }

    if let Some(kind) = rule.kind {
        if !kind.matches(value) {
            return fail(
                "type",
                ValidateMessages::format(&messages.kind, &[path, kind.as_str()]),
            );
        }
    }

    if let Some(allowed) = &rule.one_of {
        if !allowed.contains(value) {
            let listed = allowed.iter().map(label).collect::<Vec<_>>().join(", ");
            return fail("enum", ValidateMessages::format(&messages.one_of, &[path, listed.as_str()]));
        }
    }

    let (quantity, templates) = measure(value, messages)?;
    let failure = range_failure(path, quantity, rule, templates)?;
    fail("range", failure)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// The quantity bounds apply to, and the templates describing it.
fn measure<'m>(value: &Value, messages: &'m ValidateMessages) -> Option<(f64, &'m RangeMessages)> {
    match value {
        Value::String(s) => Some((s.chars().count() as f64, &messages.string)),
        Value::Number(n) => n.as_f64().map(|n| (n, &messages.number)),
        Value::Array(items) => Some((items.len() as f64, &messages.array)),
        _ => None,
    }
}

fn range_failure(path: &str, measure: f64, rule: &Rule, templates: &RangeMessages) -> Option<String> {
    if let Some(len) = rule.len {
        let len_label = number(len);
        return (measure != len)
            .then(|| ValidateMessages::format(&templates.len, &[path, len_label.as_str()]));
    }
    let min_label = rule.min.map(number).unwrap_or_default();
    let max_label = rule.max.map(number).unwrap_or_default();
    let (template, args) = match (rule.min, rule.max) {
        (Some(min), Some(max)) if measure < min || measure > max => {
            (&templates.range, vec![path, min_label.as_str(), max_label.as_str()])
        }
        (Some(min), None) if measure < min => (&templates.min, vec![path, min_label.as_str()]),
        (None, Some(max)) if measure > max => (&templates.max, vec![path, max_label.as_str()]),
        _ => return None,
    };
    Some(ValidateMessages::format(template, &args))
}

fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
