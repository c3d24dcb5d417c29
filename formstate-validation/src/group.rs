//! Trigger-scoped rule groups.

use crate::rule::Rule;
use serde::{Deserialize, Deserializer, Serialize};

/// Rules that run when any of `trigger` fires.
///
/// `{ "trigger": "onBlur", "rules": [{ "required": true }] }` and
/// `{ "trigger": ["onBlur"], ... }` deserialize to the same group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateGroup {
    #[serde(default, deserialize_with = "one_or_many")]
    pub trigger: Vec<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl ValidateGroup {
    /// A group running `rules` on any of `trigger`.
    pub fn new<I, S>(trigger: I, rules: Vec<Rule>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trigger: trigger.into_iter().map(Into::into).collect(),
            rules,
        }
    }

    /// Returns true if this group runs for `action` (always, when no action
    /// filter applies).
    pub fn applies_to(&self, action: Option<&str>) -> bool {
        action.is_none_or(|action| self.trigger.iter().any(|t| t == action))
    }

    /// Rules of every group that applies to `action`, flattened in order.
    pub fn rules_for_action(groups: &[ValidateGroup], action: Option<&str>) -> Vec<Rule> {
        groups
            .iter()
            .filter(|group| group.applies_to(action))
            .flat_map(|group| group.rules.iter().cloned())
            .collect()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![one],
        OneOrMany::Many(many) => many,
    })
}

/// Merges explicit `validate` groups with the `rules` shorthand.
///
/// The shorthand becomes one extra group bound to `validate_trigger`.
pub fn normalize_validate_rules(
    validate: Vec<ValidateGroup>,
    rules: Option<Vec<Rule>>,
    validate_trigger: &[String],
) -> Vec<ValidateGroup> {
    let mut groups = validate;
    if let Some(rules) = rules {
        groups.push(ValidateGroup {
            trigger: validate_trigger.to_vec(),
            rules,
        });
    }
    groups
}

/// Every trigger name bound to at least one non-empty group, in order.
pub fn validate_triggers(groups: &[ValidateGroup]) -> Vec<String> {
    groups
        .iter()
        .filter(|group| !group.rules.is_empty())
        .flat_map(|group| group.trigger.iter().cloned())
        .collect()
}

/// Returns true if any group carries at least one rule.
pub fn has_rules(groups: &[ValidateGroup]) -> bool {
    groups.iter().any(|group| !group.rules.is_empty())
}
