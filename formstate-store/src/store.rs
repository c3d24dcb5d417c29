//! The fields store.

use crate::meta::{ClearedField, FieldMeta};
use crate::record::{FieldRecord, FieldSnapshot, FieldTree};
use formstate_path::{flatten, is_part_of, set_path};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

const UNWRAPPED_FIELD_DATA: &str = "You must wrap field data with `FieldTree::Field`.";
const UNREGISTERED_FIELD_VALUE: &str =
    "You cannot set a form field before rendering a field associated with the value.";

/// Records, metadata and cleared-field cache of one form, keyed by path.
///
/// Iteration order everywhere is registration order.
#[derive(Debug, Default)]
pub struct FieldsStore {
    fields: IndexMap<String, FieldRecord>,
    fields_meta: IndexMap<String, FieldMeta>,
    cleared: HashMap<String, ClearedField>,
}

impl FieldsStore {
    /// Creates a store seeded with externally supplied records.
    pub fn new(fields: &FieldTree) -> Self {
        Self {
            fields: flatten_field_tree(fields),
            ..Self::default()
        }
    }

    /// Replaces every record with the ones in `fields`.
    pub fn update_fields(&mut self, fields: &FieldTree) {
        self.fields = flatten_field_tree(fields);
    }

    // ── Metadata ─────────────────────────────────────────────────

    /// Registers or replaces the metadata of `name`.
    ///
    /// Any cleared-field cache entry for `name` is discarded: a fresh
    /// registration never resurrects stale state.
    pub fn set_field_meta(&mut self, name: &str, meta: FieldMeta) {
        self.cleared.remove(name);
        self.fields_meta.insert(name.to_string(), meta);
    }

    /// Metadata of `name`, if registered.
    pub fn get_field_meta(&self, name: &str) -> Option<&FieldMeta> {
        self.fields_meta.get(name)
    }

    /// Returns true if `name` is registered.
    pub fn has_field_meta(&self, name: &str) -> bool {
        self.fields_meta.contains_key(name)
    }

    /// Every registered path.
    pub fn get_all_fields_name(&self) -> Vec<String> {
        self.fields_meta.keys().cloned().collect()
    }

    /// Every registered path that is not hidden.
    pub fn get_valid_fields_name(&self) -> Vec<String> {
        self.fields_meta
            .iter()
            .filter(|(_, meta)| !meta.hidden)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Valid paths equal to, or nested under, any of `partial_names`.
    pub fn get_valid_fields_full_name<S: AsRef<str>>(&self, partial_names: &[S]) -> Vec<String> {
        self.get_valid_fields_name()
            .into_iter()
            .filter(|full| {
                partial_names.iter().any(|partial| {
                    let partial = partial.as_ref();
                    full == partial || is_part_of(partial, full)
                })
            })
            .collect()
    }

    /// Returns true if `name` neither contains nor is contained by a
    /// registered path (`a` and `a.b` cannot coexist; `a` and `ab` can).
    pub fn is_valid_nested_field_name(&self, name: &str) -> bool {
        self.fields_meta
            .keys()
            .all(|n| !is_part_of(n, name) && !is_part_of(name, n))
    }

    /// Overwrites the initial value of every registered path found in
    /// `initial_values`.
    pub fn set_fields_initial_value(&mut self, initial_values: &Value) {
        for (name, value) in self.flatten_registered_fields(initial_values) {
            if let Some(meta) = self.fields_meta.get_mut(&name) {
                meta.initial_value = Some(value);
            }
        }
    }

    // ── Records ──────────────────────────────────────────────────

    /// Flattens a nested value tree, treating registered paths as leaves.
    pub fn flatten_registered_fields(&self, values: &Value) -> IndexMap<String, Value> {
        flatten(
            values,
            |path, _| self.fields_meta.contains_key(path),
            UNREGISTERED_FIELD_VALUE,
        )
        .leaves
    }

    /// Stores `fields` (one whole record per path), then re-runs every
    /// registered field's `normalize` against the new values.
    pub fn set_fields(&mut self, fields: IndexMap<String, FieldRecord>) {
        let previous: HashMap<String, Value> = self
            .fields_meta
            .iter()
            .filter(|(_, meta)| meta.normalize.is_some())
            .map(|(name, _)| (name.clone(), self.value_or_null(name)))
            .collect();

        for (name, record) in fields {
            self.fields.insert(name, record);
        }

        let now_values: IndexMap<String, Value> = self
            .fields_meta
            .keys()
            .map(|name| (name.clone(), self.value_or_null(name)))
            .collect();

        for (name, value) in &now_values {
            let Some(normalize) = self.fields_meta.get(name).and_then(|m| m.normalize.clone()) else {
                continue;
            };
            let prev = previous.get(name).unwrap_or(&Value::Null);
            let normalized = normalize(value, prev, &now_values);
            if &normalized != value {
                debug!(field = %name, "value normalized");
                self.fields.entry(name.clone()).or_default().value = Some(normalized);
            }
        }
    }

    /// Marks every recorded field that has rules as dirty.
    pub fn set_fields_as_dirty(&mut self) {
        for (name, field) in self.fields.iter_mut() {
            if self.fields_meta.get(name).is_some_and(FieldMeta::has_rules) {
                field.dirty = true;
            }
        }
    }

    /// Computes the records that reset `names` (every registered path when
    /// `None`). Only fields holding an explicit value are included; feed the
    /// result to [`set_fields`](Self::set_fields) to apply it.
    pub fn reset_fields<S: AsRef<str>>(&self, names: Option<&[S]>) -> IndexMap<String, FieldRecord> {
        let names = match names {
            Some(partial) => self.get_valid_fields_full_name(partial),
            None => self.get_all_fields_name(),
        };
        names
            .into_iter()
            .filter(|name| self.fields.get(name).is_some_and(|f| f.value.is_some()))
            .map(|name| (name, FieldRecord::default()))
            .collect()
    }

    /// Removes both record and metadata of `name`.
    pub fn clear_field(&mut self, name: &str) {
        self.fields.shift_remove(name);
        self.fields_meta.shift_remove(name);
    }

    /// Returns the record of `name`, or an empty one.
    pub fn get_field(&self, name: &str) -> FieldSnapshot {
        FieldSnapshot::new(name, self.fields.get(name).cloned().unwrap_or_default())
    }

    /// The effective value: the record's value, else the initial value.
    pub fn value_from_fields(&self, name: &str) -> Option<Value> {
        self.fields
            .get(name)
            .and_then(|field| field.value.clone())
            .or_else(|| self.fields_meta.get(name).and_then(|m| m.initial_value.clone()))
    }

    fn value_or_null(&self, name: &str) -> Value {
        self.value_from_fields(name).unwrap_or(Value::Null)
    }

    /// Props that carry the field value to its control. Calls the field's
    /// `get_value_props` override, if any.
    pub fn get_field_value_prop_value(&self, meta: &FieldMeta) -> Map<String, Value> {
        let value = self
            .fields
            .get(&meta.name)
            .and_then(|field| field.value.clone())
            .or_else(|| meta.initial_value.clone())
            .unwrap_or(Value::Null);
        match &meta.get_value_props {
            Some(get_value_props) => get_value_props(&value),
            None => {
                let mut props = Map::new();
                props.insert(meta.value_prop_name.clone(), value);
                props
            }
        }
    }

    // ── Nested reads ─────────────────────────────────────────────

    /// Nested snapshot of every registered field's effective value.
    pub fn get_all_values(&self) -> Value {
        let mut all = Value::Object(Map::new());
        for name in self.fields_meta.keys() {
            set_path(&mut all, name, self.value_or_null(name));
        }
        all
    }

    /// Nested values of `names` (all valid paths when `None`).
    pub fn get_fields_value<S: AsRef<str>>(&self, names: Option<&[S]>) -> Value {
        self.nested_fields(names, |name| self.get_field_value(name))
    }

    /// Value of `name`; a partial path yields the nested values under it.
    pub fn get_field_value(&self, name: &str) -> Value {
        self.nested_field(name, |full| self.value_or_null(full))
    }

    /// Nested error messages of `names` (all valid paths when `None`).
    pub fn get_fields_error<S: AsRef<str>>(&self, names: Option<&[S]>) -> Value {
        self.nested_fields(names, |name| self.get_field_error(name))
    }

    /// Error messages of `name` as an array (or `null`); a partial path
    /// yields the nested messages under it.
    pub fn get_field_error(&self, name: &str) -> Value {
        self.nested_field(name, |full| {
            self.fields
                .get(full)
                .and_then(FieldRecord::error_messages)
                .map_or(Value::Null, |messages| {
                    Value::Array(messages.into_iter().map(Value::String).collect())
                })
        })
    }

    /// Returns true while `name` has a validation batch in flight.
    pub fn is_field_validating(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|f| f.validating)
    }

    /// Returns true if any of `names` (all visible fields when `None`) is validating.
    pub fn is_fields_validating<S: AsRef<str>>(&self, names: Option<&[S]>) -> bool {
        self.any_field(names, |name| self.is_field_validating(name))
    }

    /// Returns true once a value has been collected for `name`.
    pub fn is_field_touched(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|f| f.touched)
    }

    /// Returns true if any of `names` (all visible fields when `None`) is touched.
    pub fn is_fields_touched<S: AsRef<str>>(&self, names: Option<&[S]>) -> bool {
        self.any_field(names, |name| self.is_field_touched(name))
    }

    /// Registered, visible fields that have no record yet, as records
    /// holding their initial value.
    pub fn get_not_collected_fields(&self) -> FieldTree {
        let mut tree = FieldTree::object();
        for name in self.get_valid_fields_name() {
            if self.fields.contains_key(&name) {
                continue;
            }
            let initial = self.fields_meta.get(&name).and_then(|m| m.initial_value.clone());
            tree.insert(
                &name,
                FieldRecord {
                    value: initial,
                    ..FieldRecord::default()
                },
            );
        }
        tree
    }

    /// Every record (collected or not) as a nested tree.
    pub fn get_nested_all_fields(&self) -> FieldTree {
        let mut tree = self.get_not_collected_fields();
        for (name, record) in &self.fields {
            tree.insert(name, record.clone());
        }
        tree
    }

    fn any_field<S: AsRef<str>>(&self, names: Option<&[S]>, test: impl Fn(&str) -> bool) -> bool {
        match names {
            Some(names) => names.iter().any(|n| test(n.as_ref())),
            None => self.get_valid_fields_name().iter().any(|n| test(n)),
        }
    }

    fn nested_fields<S: AsRef<str>>(&self, names: Option<&[S]>, getter: impl Fn(&str) -> Value) -> Value {
        let names: Vec<String> = match names {
            Some(names) => names.iter().map(|n| n.as_ref().to_string()).collect(),
            None => self.get_valid_fields_name(),
        };
        let mut out = Value::Object(Map::new());
        for name in &names {
            set_path(&mut out, name, getter(name));
        }
        out
    }

    fn nested_field(&self, name: &str, getter: impl Fn(&str) -> Value) -> Value {
        let full_names = self.get_valid_fields_full_name(&[name]);
        if full_names.is_empty() || (full_names.len() == 1 && full_names[0] == name) {
            return getter(name);
        }
        let is_array = full_names[0].as_bytes().get(name.len()) == Some(&b'[');
        let suffix_start = if is_array { name.len() } else { name.len() + 1 };
        let mut out = if is_array {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
        for full in &full_names {
            if let Some(suffix) = full.get(suffix_start..) {
                set_path(&mut out, suffix, getter(full));
            }
        }
        out
    }

    // ── Cleared-field cache ──────────────────────────────────────

    /// Caches the current record and metadata of `name`, if registered.
    pub fn cache_cleared_field(&mut self, name: &str) {
        if let Some(meta) = self.fields_meta.get(name).cloned() {
            let field = self.fields.get(name).cloned().unwrap_or_default();
            self.cleared.insert(name.to_string(), ClearedField { field, meta });
        }
    }

    /// Removes and returns the cache entry of `name`.
    pub fn take_cleared_field(&mut self, name: &str) -> Option<ClearedField> {
        self.cleared.remove(name)
    }

    /// Returns true if a cleared copy of `name` is cached.
    pub fn has_cleared_field(&self, name: &str) -> bool {
        self.cleared.contains_key(name)
    }

    /// Drops the cache entry of `name`.
    pub fn forget_cleared_field(&mut self, name: &str) {
        self.cleared.remove(name);
    }

    /// Drops every cache entry.
    pub fn forget_all_cleared(&mut self) {
        self.cleared.clear();
    }
}

fn flatten_field_tree(fields: &FieldTree) -> IndexMap<String, FieldRecord> {
    flatten(fields, |_, node| matches!(node, FieldTree::Field(_)), UNWRAPPED_FIELD_DATA)
        .leaves
        .into_iter()
        .filter_map(|(name, node)| match node {
            FieldTree::Field(record) => Some((name, record)),
            _ => None,
        })
        .collect()
}
