//! The form handle.

use crate::config::{FormConfig, FormHooks};
use crate::error::{FormError, FormResult};
use crate::lifecycle::Lifecycle;
use crate::options::{Binding, FieldOptions, InputProps};
use formstate_store::{FieldMeta, FieldRecord, FieldSnapshot, FieldTree, FieldsStore};
use formstate_validation::{
    normalize_validate_rules, validate_triggers, RuleSetValidator, RuleValidator,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Everything guarded by the form's lock.
#[derive(Default)]
pub(crate) struct FormState {
    pub(crate) store: FieldsStore,
    pub(crate) lifecycle: Lifecycle,
}

impl FormState {
    /// Removes a field's record, metadata and bound instance.
    pub(crate) fn clear_field(&mut self, name: &str) {
        self.store.clear_field(name);
        self.lifecycle.detach(name);
    }
}

/// A fields-changed notification, computed under the lock and delivered
/// after it is released.
pub(crate) struct FieldsNotice {
    changed: FieldTree,
    all: FieldTree,
}

/// A values-changed notification.
pub(crate) struct ValuesNotice {
    pub(crate) changed: Value,
    pub(crate) all: Value,
}

struct FormInner {
    state: Mutex<FormState>,
    config: FormConfig,
    hooks: FormHooks,
    validator: Arc<dyn RuleValidator>,
}

/// Handle to one form's state.
///
/// Cloning is cheap and every clone addresses the same fields. Store
/// mutations are synchronous; only validation suspends, and the lock is
/// never held while it does.
#[derive(Clone)]
pub struct Form {
    inner: Arc<FormInner>,
}

impl Form {
    /// Creates a form validated by the built-in [`RuleSetValidator`].
    pub fn new(config: FormConfig) -> Self {
        let validator = match &config.validate_messages {
            Some(messages) => RuleSetValidator::with_messages(messages.clone()),
            None => RuleSetValidator::new(),
        };
        Self::with_validator(config, Arc::new(validator))
    }

    /// Creates a form with a custom validator.
    pub fn with_validator(config: FormConfig, validator: Arc<dyn RuleValidator>) -> Self {
        Self::with_hooks(config, validator, FormHooks::default())
    }

    /// Creates a form with a custom validator and change notifications.
    pub fn with_hooks(
        config: FormConfig,
        validator: Arc<dyn RuleValidator>,
        hooks: FormHooks,
    ) -> Self {
        Self {
            inner: Arc::new(FormInner {
                state: Mutex::new(FormState::default()),
                config,
                hooks,
                validator,
            }),
        }
    }

    /// The configuration the form was built with.
    pub fn config(&self) -> &FormConfig {
        &self.inner.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FormState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn hooks(&self) -> &FormHooks {
        &self.inner.hooks
    }

    pub(crate) fn validator(&self) -> Arc<dyn RuleValidator> {
        Arc::clone(&self.inner.validator)
    }

    // ── Registration ─────────────────────────────────────────────

    /// Registers (or re-registers) the field at `name` and returns the props
    /// a control needs to bind to it. The field counts as rendered for the
    /// current pass.
    ///
    /// An initial value set earlier survives re-registration unless
    /// `options` carries a new one. Any cached state of a previously cleared
    /// field at `name` is discarded.
    pub fn register_field(&self, name: &str, options: FieldOptions) -> FormResult<InputProps> {
        if name.is_empty() {
            return Err(FormError::MissingName);
        }
        let config = &self.inner.config;
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.store.is_valid_nested_field_name(name) {
            if config.strict_names {
                return Err(FormError::NameConflict {
                    name: name.to_string(),
                });
            }
            warn!(field = %name, "one field name cannot be part of another, e.g. `a` and `a.b`");
        }

        let trigger = options
            .trigger
            .unwrap_or_else(|| config.default_trigger.clone());
        let validate_trigger = options
            .validate_trigger
            .unwrap_or_else(|| vec![trigger.clone()]);
        let validate = normalize_validate_rules(options.validate, options.rules, &validate_trigger);
        let initial_value = options.initial_value.or_else(|| {
            state
                .store
                .get_field_meta(name)
                .and_then(|meta| meta.initial_value.clone())
        });
        let meta = FieldMeta {
            name: name.to_string(),
            trigger,
            validate_trigger,
            validate,
            initial_value,
            value_prop_name: options
                .value_prop_name
                .unwrap_or_else(|| config.default_value_prop_name.clone()),
            normalize: options.normalize,
            get_value_from_event: options.get_value_from_event,
            get_value_props: options.get_value_props,
            handlers: options.handlers,
            preserve: options.preserve,
            hidden: options.hidden,
            validate_first: options.validate_first,
        };

        let mut actions = IndexMap::new();
        for action in validate_triggers(&meta.validate) {
            actions.entry(action).or_insert(Binding::CollectValidate);
        }
        actions
            .entry(meta.trigger.clone())
            .or_insert(Binding::Collect);

        let mut props = InputProps {
            values: state.store.get_field_value_prop_value(&meta),
            actions,
            name: config.field_name_prop.then(|| match &config.name {
                Some(form) => format!("{form}_{name}"),
                None => name.to_string(),
            }),
            meta: config.expose_meta.then(|| meta.clone()),
            data: None,
        };
        state.store.set_field_meta(name, meta);
        if config.expose_data {
            props.data = Some(state.store.get_field(name));
        }
        state.lifecycle.mark_rendered(name);
        Ok(props)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Replaces the records of registered fields. Records for unregistered
    /// paths are dropped with a warning.
    pub fn set_fields(&self, fields: IndexMap<String, FieldRecord>) {
        let notice = {
            let mut state = self.lock();
            let fields = fields
                .into_iter()
                .filter(|(name, _)| {
                    let registered = state.store.has_field_meta(name);
                    if !registered {
                        warn!(field = %name, "cannot set a form field before it is registered");
                    }
                    registered
                })
                .collect();
            self.apply_fields(&mut state.store, fields)
        };
        self.notify_fields(notice);
    }

    /// Sets the values of registered fields from a nested value tree.
    ///
    /// Each matched field's record is replaced by one holding only the new
    /// value. Branches that match no registered field are dropped with a
    /// warning.
    pub fn set_fields_value(&self, values: &Value) {
        let (fields_notice, all) = {
            let mut state = self.lock();
            let fields = state
                .store
                .flatten_registered_fields(values)
                .into_iter()
                .map(|(name, value)| (name, FieldRecord::with_value(value)))
                .collect();
            let notice = self.apply_fields(&mut state.store, fields);
            let all = self
                .inner
                .hooks
                .on_values_change
                .as_ref()
                .map(|_| state.store.get_all_values());
            (notice, all)
        };
        self.notify_fields(fields_notice);
        self.notify_values(all.map(|all| ValuesNotice {
            changed: values.clone(),
            all,
        }));
    }

    /// Sets the initial value of every registered field found in `values`.
    pub fn set_fields_initial_value(&self, values: &Value) {
        self.lock().store.set_fields_initial_value(values);
    }

    /// Reverts `names` (every field when `None`) to their initial values and
    /// forgets their cached cleared state.
    pub fn reset_fields<S: AsRef<str>>(&self, names: Option<&[S]>) {
        let notice = {
            let mut state = self.lock();
            let reset = state.store.reset_fields(names);
            let notice = self.apply_fields(&mut state.store, reset);
            match names {
                Some(names) => {
                    for name in names {
                        state.store.forget_cleared_field(name.as_ref());
                    }
                }
                None => state.store.forget_all_cleared(),
            }
            notice
        };
        self.notify_fields(notice);
    }

    /// Replaces every record with externally controlled ones.
    pub fn update_fields(&self, fields: &FieldTree) {
        self.lock().store.update_fields(fields);
        info!("fields replaced from external state");
    }

    pub(crate) fn apply_fields(
        &self,
        store: &mut FieldsStore,
        fields: IndexMap<String, FieldRecord>,
    ) -> Option<FieldsNotice> {
        if fields.is_empty() {
            return None;
        }
        let names: Vec<String> = fields.keys().cloned().collect();
        store.set_fields(fields);
        self.inner.hooks.on_fields_change.as_ref()?;
        let changed = FieldTree::from_records(names.iter().map(|name| (name, store.get_field(name).record)));
        Some(FieldsNotice {
            changed,
            all: store.get_nested_all_fields(),
        })
    }

    pub(crate) fn notify_fields(&self, notice: Option<FieldsNotice>) {
        if let (Some(notice), Some(hook)) = (notice, &self.inner.hooks.on_fields_change) {
            hook(self, &notice.changed, &notice.all);
        }
    }

    pub(crate) fn notify_values(&self, notice: Option<ValuesNotice>) {
        if let (Some(notice), Some(hook)) = (notice, &self.inner.hooks.on_values_change) {
            hook(self, &notice.changed, &notice.all);
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The record of `name`, or an empty one.
    pub fn get_field(&self, name: &str) -> FieldSnapshot {
        self.lock().store.get_field(name)
    }

    /// A copy of the metadata of `name`, if registered.
    pub fn get_field_meta(&self, name: &str) -> Option<FieldMeta> {
        self.lock().store.get_field_meta(name).cloned()
    }

    /// Value of `name`; a partial path yields the nested values under it.
    pub fn get_field_value(&self, name: &str) -> Value {
        self.lock().store.get_field_value(name)
    }

    /// Nested values of `names`, or of every visible field when `None`.
    pub fn get_fields_value<S: AsRef<str>>(&self, names: Option<&[S]>) -> Value {
        self.lock().store.get_fields_value(names)
    }

    /// Nested values of every registered field, hidden ones included.
    pub fn get_all_values(&self) -> Value {
        self.lock().store.get_all_values()
    }

    /// Error messages of `name`, or `null` when it has none.
    pub fn get_field_error(&self, name: &str) -> Value {
        self.lock().store.get_field_error(name)
    }

    /// Nested error messages of `names`, or of every visible field when `None`.
    pub fn get_fields_error<S: AsRef<str>>(&self, names: Option<&[S]>) -> Value {
        self.lock().store.get_fields_error(names)
    }

    /// Returns true while `name` has a validation batch in flight.
    pub fn is_field_validating(&self, name: &str) -> bool {
        self.lock().store.is_field_validating(name)
    }

    /// Returns true if any of `names` (every visible field when `None`) is validating.
    pub fn is_fields_validating<S: AsRef<str>>(&self, names: Option<&[S]>) -> bool {
        self.lock().store.is_fields_validating(names)
    }

    /// Returns true once a value has been collected for `name`.
    pub fn is_field_touched(&self, name: &str) -> bool {
        self.lock().store.is_field_touched(name)
    }

    /// Returns true if any of `names` (every visible field when `None`) is touched.
    pub fn is_fields_touched<S: AsRef<str>>(&self, names: Option<&[S]>) -> bool {
        self.lock().store.is_fields_touched(names)
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.inner.config)
            .field("hooks", &self.inner.hooks)
            .finish_non_exhaustive()
    }
}
