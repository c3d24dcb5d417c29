//! Form-level configuration and change notifications.

use crate::form::Form;
use formstate_store::{FieldTree, DEFAULT_TRIGGER, DEFAULT_VALUE_PROP_NAME};
use formstate_validation::ValidateMessages;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Configuration for a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Form name, used to prefix the name attribute of bound controls.
    pub name: Option<String>,
    /// Trigger for fields that do not set one.
    pub default_trigger: String,
    /// Value prop for fields that do not set one.
    pub default_value_prop_name: String,
    /// Emit a name attribute on input props.
    pub field_name_prop: bool,
    /// Attach the field's metadata to its input props.
    pub expose_meta: bool,
    /// Attach the field's current record to its input props.
    pub expose_data: bool,
    /// Reject conflicting field names instead of logging them.
    pub strict_names: bool,
    /// Message templates handed to the validator with every batch.
    pub validate_messages: Option<ValidateMessages>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            name: None,
            default_trigger: DEFAULT_TRIGGER.to_string(),
            default_value_prop_name: DEFAULT_VALUE_PROP_NAME.to_string(),
            field_name_prop: false,
            expose_meta: false,
            expose_data: false,
            strict_names: true,
            validate_messages: None,
        }
    }
}

/// `(form, changed_values, all_values)`, both nested.
pub type ValuesChangeFn = Arc<dyn Fn(&Form, &Value, &Value) + Send + Sync>;

/// `(form, changed_fields, all_fields)`, both nested.
pub type FieldsChangeFn = Arc<dyn Fn(&Form, &FieldTree, &FieldTree) + Send + Sync>;

/// Callbacks invoked after a committed change.
///
/// Hooks run after the form's lock is released, so they may read from (or
/// write to) the form they receive.
#[derive(Clone, Default)]
pub struct FormHooks {
    pub(crate) on_values_change: Option<ValuesChangeFn>,
    pub(crate) on_fields_change: Option<FieldsChangeFn>,
}

impl FormHooks {
    /// No hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when collection or `set_fields_value` changes values.
    pub fn on_values_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Form, &Value, &Value) + Send + Sync + 'static,
    {
        self.on_values_change = Some(Arc::new(hook));
        self
    }

    /// Called whenever field records are written.
    pub fn on_fields_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Form, &FieldTree, &FieldTree) + Send + Sync + 'static,
    {
        self.on_fields_change = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for FormHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHooks")
            .field("on_values_change", &self.on_values_change.is_some())
            .field("on_fields_change", &self.on_fields_change.is_some())
            .finish()
    }
}
