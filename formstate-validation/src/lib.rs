//! Validation rules and the rule-validation collaborator for formstate.
//!
//! The form engine never interprets rules itself. It groups them per field
//! path, picks the ones whose trigger matches the event that started a
//! validation pass, and hands them to a [`RuleValidator`] together with the
//! values captured at that moment. Whatever the validator reports comes back
//! as a list of [`Violation`]s keyed by field path.
//!
//! - [`Rule`] / [`RuleType`]: declarative rule data (serde-friendly)
//! - [`ValidateGroup`]: rules bound to a set of trigger names
//! - [`RuleValidator`]: the async collaborator contract
//! - [`RuleSetValidator`]: a built-in validator for the common rule kinds
//! - [`ValidateMessages`]: message templates used by the built-in validator

mod builtin;
mod group;
mod messages;
mod rule;
mod validator;
mod violation;

pub use builtin::RuleSetValidator;
pub use group::{has_rules, normalize_validate_rules, validate_triggers, ValidateGroup};
pub use messages::ValidateMessages;
pub use rule::{Rule, RuleType};
pub use validator::{FirstFields, RuleValidator, ValidateOptions, ValidationRequest};
pub use violation::Violation;
