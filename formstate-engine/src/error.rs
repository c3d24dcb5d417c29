//! Error types for the form engine.

use crate::validation::ValidationErrors;
use serde_json::Value;
use thiserror::Error;

/// Result type for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Contract violations reported by form operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field was registered without a path.
    #[error("a field must be registered with a non-empty name")]
    MissingName,

    /// The path contains, or is contained by, an already registered path.
    #[error("one field name cannot be part of another, e.g. `a` and `a.b`; check field: {name}")]
    NameConflict { name: String },

    /// The path has no registration.
    #[error("field is not registered: {name}")]
    NotRegistered { name: String },

    /// The action is neither the field's trigger nor one of its validate triggers.
    #[error("field {name} is not bound to action {action}")]
    UnboundAction { name: String, action: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A bulk validation that found violations (or expired fields).
///
/// Carries both the errors and the values of the requested fields, so a
/// caller can still inspect what was submitted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed for {} field(s)", .errors.len())]
pub struct ValidationFailure {
    pub errors: ValidationErrors,
    pub values: Value,
}
