//! Registration options and the props handed back to the adapter.

use formstate_store::{
    EventHandler, FieldMeta, FieldSnapshot, GetValueFromEventFn, GetValuePropsFn, NormalizeFn,
};
use formstate_validation::{Rule, ValidateGroup};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a bound action is handled by [`Form::collect`](crate::Form::collect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Store the new value.
    Collect,
    /// Store the new value and validate the field.
    CollectValidate,
}

/// Options for [`Form::register_field`](crate::Form::register_field).
///
/// Unset options fall back to the form's [`FormConfig`](crate::FormConfig).
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub trigger: Option<String>,
    /// Defaults to `[trigger]`.
    pub validate_trigger: Option<Vec<String>>,
    pub value_prop_name: Option<String>,
    /// Shorthand for one group bound to `validate_trigger`.
    pub rules: Option<Vec<Rule>>,
    pub validate: Vec<ValidateGroup>,
    pub initial_value: Option<Value>,
    pub normalize: Option<NormalizeFn>,
    pub get_value_from_event: Option<GetValueFromEventFn>,
    pub get_value_props: Option<GetValuePropsFn>,
    pub handlers: HashMap<String, EventHandler>,
    pub preserve: bool,
    pub hidden: bool,
    pub validate_first: bool,
}

impl FieldOptions {
    /// Options with every value left to the form's defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Action that collects the value.
    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Actions that collect and validate when only `rules` is given.
    pub fn validate_trigger<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validate_trigger = Some(triggers.into_iter().map(Into::into).collect());
        self
    }

    /// Prop the value is handed to the control under.
    pub fn value_prop_name(mut self, name: impl Into<String>) -> Self {
        self.value_prop_name = Some(name.into());
        self
    }

    /// Rules bound to `validate_trigger`.
    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Adds a group of rules with its own triggers.
    pub fn validate(mut self, group: ValidateGroup) -> Self {
        self.validate.push(group);
        self
    }

    /// Value reported until one is collected. Also the target of a reset.
    pub fn initial_value(mut self, value: Value) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Rewrites each stored value as `(value, previous, all_values)`.
    ///
    /// Runs while the form is locked, so it must not call back into the
    /// form. It only sees the values it is given.
    pub fn normalize<F>(mut self, normalize: F) -> Self
    where
        F: Fn(&Value, &Value, &IndexMap<String, Value>) -> Value + Send + Sync + 'static,
    {
        self.normalize = Some(Arc::new(normalize));
        self
    }

    /// Replaces [`value_from_event`](crate::value_from_event). Runs with the
    /// form unlocked.
    pub fn get_value_from_event<F>(mut self, extract: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.get_value_from_event = Some(Arc::new(extract));
        self
    }

    /// Builds the value props from the field value, in place of
    /// `{value_prop_name: value}`.
    ///
    /// Runs while the form is locked during registration, so it must not
    /// call back into the form.
    pub fn get_value_props<F>(mut self, props: F) -> Self
    where
        F: Fn(&Value) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.get_value_props = Some(Arc::new(props));
        self
    }

    /// Passes the raw arguments of `action` to `handler` before collecting.
    /// Runs with the form unlocked, so it may read or change the form.
    pub fn handler<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.handlers.insert(action.into(), Arc::new(handler));
        self
    }

    /// Keep the field registered after its control unmounts.
    pub fn preserve(mut self) -> Self {
        self.preserve = true;
        self
    }

    /// Leave the field out of bulk reads and bulk validation.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Stop at the first failing rule.
    pub fn validate_first(mut self) -> Self {
        self.validate_first = true;
        self
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("trigger", &self.trigger)
            .field("validate_trigger", &self.validate_trigger)
            .field("rules", &self.rules)
            .field("validate", &self.validate)
            .field("initial_value", &self.initial_value)
            .field("preserve", &self.preserve)
            .field("hidden", &self.hidden)
            .field("validate_first", &self.validate_first)
            .finish_non_exhaustive()
    }
}

/// What the adapter needs to bind a control to a registered field.
#[derive(Debug, Clone)]
pub struct InputProps {
    /// Value props (`{value_prop_name: value}` unless overridden).
    pub values: Map<String, Value>,
    /// Actions to forward to [`Form::collect`](crate::Form::collect).
    pub actions: IndexMap<String, Binding>,
    /// Name attribute, when the form emits one.
    pub name: Option<String>,
    /// Field metadata, when the form exposes it.
    pub meta: Option<FieldMeta>,
    /// Current field record, when the form exposes it.
    pub data: Option<FieldSnapshot>,
}

impl InputProps {
    /// The value prop named `prop`.
    pub fn value(&self, prop: &str) -> Option<&Value> {
        self.values.get(prop)
    }

    /// How `action` is handled, if the control should forward it.
    pub fn binding(&self, action: &str) -> Option<Binding> {
        self.actions.get(action).copied()
    }
}
