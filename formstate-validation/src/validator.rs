//! The rule-validation collaborator contract.

use crate::messages::ValidateMessages;
use crate::rule::Rule;
use crate::violation::Violation;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which fields stop at their first violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FirstFields {
    /// `true` for every field, `false` for none.
    All(bool),
    /// Only the listed paths.
    Only(Vec<String>),
}

impl Default for FirstFields {
    fn default() -> Self {
        FirstFields::All(false)
    }
}

impl FirstFields {
    /// Returns true if `path` stops at its first violation.
    pub fn applies_to(&self, path: &str) -> bool {
        match self {
            FirstFields::All(all) => *all,
            FirstFields::Only(paths) => paths.iter().any(|p| p == path),
        }
    }
}

impl From<bool> for FirstFields {
    fn from(all: bool) -> Self {
        FirstFields::All(all)
    }
}

impl From<Vec<String>> for FirstFields {
    fn from(paths: Vec<String>) -> Self {
        FirstFields::Only(paths)
    }
}

/// Options forwarded to the validator with each batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateOptions {
    pub first_fields: FirstFields,
    /// Message templates configured on the form, if any.
    pub messages: Option<ValidateMessages>,
}

/// One validation batch: rules and snapshot values, keyed by field path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRequest {
    pub rules: IndexMap<String, Vec<Rule>>,
    pub values: IndexMap<String, Value>,
    pub options: ValidateOptions,
}

/// Validates a batch of field values against their rules.
///
/// Implementations may suspend (remote checks, debounced lookups). The
/// engine reconciles the returned violations against the store when the
/// future resolves, discarding results for fields that changed meanwhile.
#[async_trait]
pub trait RuleValidator: Send + Sync {
    /// Returns every violation found; an empty list means the batch passed.
    async fn validate(&self, request: ValidationRequest) -> Vec<Violation>;
}
