use crate::record::FieldRecord;
use formstate_validation::{has_rules, ValidateGroup};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Collection event used when a field does not name one.
pub const DEFAULT_TRIGGER: &str = "onChange";

/// Prop that carries a field's value to its control, unless overridden.
pub const DEFAULT_VALUE_PROP_NAME: &str = "value";

/// `normalize(new_value, previous_value, all_current_values) -> value`.
///
/// Absent values are passed as `null`.
pub type NormalizeFn = Arc<dyn Fn(&Value, &Value, &IndexMap<String, Value>) -> Value + Send + Sync>;

/// Extracts the new field value from the arguments of a UI event.
pub type GetValueFromEventFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Maps a field value to the props handed to its control.
pub type GetValuePropsFn = Arc<dyn Fn(&Value) -> Map<String, Value> + Send + Sync>;

/// Pass-through callback invoked with the raw event arguments.
pub type EventHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Per-path configuration of a registered field.
#[derive(Clone)]
pub struct FieldMeta {
    pub name: String,
    /// Event that collects a new value.
    pub trigger: String,
    /// Events that also run validation.
    pub validate_trigger: Vec<String>,
    /// Rule groups, already normalized.
    pub validate: Vec<ValidateGroup>,
    pub initial_value: Option<Value>,
    pub value_prop_name: String,
    pub normalize: Option<NormalizeFn>,
    pub get_value_from_event: Option<GetValueFromEventFn>,
    pub get_value_props: Option<GetValuePropsFn>,
    /// Callbacks of the bound control, keyed by event name. Invoked before
    /// a value is collected for that event.
    pub handlers: HashMap<String, EventHandler>,
    /// Keep this field's state when its control unmounts.
    pub preserve: bool,
    /// Exclude this field from bulk reads and validation.
    pub hidden: bool,
    /// Stop at the first failing rule.
    pub validate_first: bool,
}

impl FieldMeta {
    /// Metadata with default triggers and no rules.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns true if any rule group carries a rule.
    pub fn has_rules(&self) -> bool {
        has_rules(&self.validate)
    }
}

impl Default for FieldMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            trigger: DEFAULT_TRIGGER.to_string(),
            validate_trigger: vec![DEFAULT_TRIGGER.to_string()],
            validate: Vec::new(),
            initial_value: None,
            value_prop_name: DEFAULT_VALUE_PROP_NAME.to_string(),
            normalize: None,
            get_value_from_event: None,
            get_value_props: None,
            handlers: HashMap::new(),
            preserve: false,
            hidden: false,
            validate_first: false,
        }
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<&String> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("validate_trigger", &self.validate_trigger)
            .field("validate", &self.validate)
            .field("initial_value", &self.initial_value)
            .field("value_prop_name", &self.value_prop_name)
            .field("normalize", &self.normalize.is_some())
            .field("get_value_from_event", &self.get_value_from_event.is_some())
            .field("get_value_props", &self.get_value_props.is_some())
            .field("handlers", &handlers)
            .field("preserve", &self.preserve)
            .field("hidden", &self.hidden)
            .field("validate_first", &self.validate_first)
            .finish()
    }
}

/// State of a field that unmounted without `preserve`, kept so a remount
/// under the same path can restore it.
#[derive(Debug, Clone)]
pub struct ClearedField {
    pub field: FieldRecord,
    pub meta: FieldMeta,
}
