//! Validation batches.
//!
//! A batch runs in three steps:
//!
//! 1. **Snapshot** (synchronous, under the form lock): every field to
//!    revalidate is marked `validating` and `dirty`, its errors are cleared,
//!    and its current value is recorded. A settled field (not dirty, already
//!    failing) keeps its errors and is left out unless the batch is forced.
//! 2. **Dispatch**: rules and snapshot values go to the [`RuleValidator`].
//!    This is the only suspension point.
//! 3. **Reconcile** (synchronous, under the form lock): violations are
//!    grouped by owning field. A field whose value changed since the snapshot
//!    is not committed; it is reported as expired instead, and the caller is
//!    expected to validate it again.
//!
//! Concurrent batches need no coordination beyond that value comparison.
//!
//! [`RuleValidator`]: formstate_validation::RuleValidator

use crate::collect::PendingValidation;
use crate::error::{FormResult, ValidationFailure};
use crate::form::{FieldsNotice, Form, FormState};
use formstate_path::set_path;
use formstate_store::{FieldMeta, FieldRecord, FieldSnapshot};
use formstate_validation::{
    FirstFields, Rule, ValidateGroup, ValidateOptions, ValidationRequest, Violation,
};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Violations of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    pub errors: Vec<Violation>,
    /// The result was computed against a value that has since changed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub expired: bool,
}

impl FieldErrors {
    /// Violation messages, in report order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }
}

/// Validation errors keyed by field path, in the order fields were first
/// reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: IndexMap<String, FieldErrors>,
}

impl ValidationErrors {
    /// Errors reported for `path`.
    pub fn get(&self, path: &str) -> Option<&FieldErrors> {
        self.fields.get(path)
    }

    /// Returns true if `path` has errors.
    pub fn contains(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    /// Number of fields with errors.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field has errors.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Paths with errors, in report order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Paths with their errors, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldErrors)> {
        self.fields.iter().map(|(path, errors)| (path.as_str(), errors))
    }

    /// The same errors as a nested tree (`{"user": {"name": {"errors": [..]}}}`).
    pub fn to_nested(&self) -> FormResult<Value> {
        let mut nested = Value::Object(Map::new());
        for (path, errors) in &self.fields {
            set_path(&mut nested, path, serde_json::to_value(errors)?);
        }
        Ok(nested)
    }

    fn push(&mut self, path: &str, violation: Violation) {
        self.fields
            .entry(path.to_string())
            .or_default()
            .errors
            .push(violation);
    }

    fn carry(&mut self, path: &str, errors: Vec<Violation>) {
        self.fields.insert(
            path.to_string(),
            FieldErrors {
                errors,
                expired: false,
            },
        );
    }

    fn expire(&mut self, path: &str) {
        self.fields.insert(
            path.to_string(),
            FieldErrors {
                errors: vec![Violation::new(path, format!("{path} need to revalidate"))],
                expired: true,
            },
        );
    }
}

/// Completion of a validation batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// `None` when every validated field passed and none expired.
    pub errors: Option<ValidationErrors>,
    /// Nested values of the requested fields at completion time.
    pub values: Value,
}

impl BatchOutcome {
    /// Returns true if no field failed or expired.
    pub fn is_valid(&self) -> bool {
        self.errors.is_none()
    }

    /// The values on success, the errors and values otherwise.
    pub fn into_result(self) -> Result<Value, ValidationFailure> {
        match self.errors {
            None => Ok(self.values),
            Some(errors) => Err(ValidationFailure {
                errors,
                values: self.values,
            }),
        }
    }
}

/// Options for [`Form::validate_fields`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateFieldsOptions {
    /// Revalidate settled fields too.
    pub force: bool,
    /// Fields that stop at their first violation. Defaults to the fields
    /// registered with `validate_first`.
    pub first_fields: Option<FirstFields>,
}

impl ValidateFieldsOptions {
    /// Revalidate fields that already carry errors.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Overrides which fields stop at their first violation.
    pub fn first_fields(mut self, first_fields: impl Into<FirstFields>) -> Self {
        self.first_fields = Some(first_fields.into());
        self
    }
}

/// A snapshotted batch, ready for dispatch.
#[derive(Debug, Default)]
pub(crate) struct Batch {
    rules: IndexMap<String, Vec<Rule>>,
    values: IndexMap<String, Value>,
    carried: ValidationErrors,
}

impl Form {
    /// Validates `names` (partial paths expand to the fields under them;
    /// every visible field when `None`). Fields without rules are skipped.
    ///
    /// The snapshot is taken before this returns; the future resolves to the
    /// requested values, or to a [`ValidationFailure`] carrying the errors
    /// and the values.
    pub fn validate_fields<S: AsRef<str>>(
        &self,
        names: Option<&[S]>,
        options: ValidateFieldsOptions,
    ) -> BoxFuture<'static, Result<Value, ValidationFailure>> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let field_names = match names {
            Some(names) => state.store.get_valid_fields_full_name(names),
            None => state.store.get_valid_fields_name(),
        };
        let fields: Vec<FieldSnapshot> = field_names
            .iter()
            .filter(|name| state.store.get_field_meta(name).is_some_and(FieldMeta::has_rules))
            .map(|name| {
                let mut field = state.store.get_field(name);
                field.record.value = state.store.value_from_fields(name);
                field
            })
            .collect();

        if fields.is_empty() {
            let values = state.store.get_fields_value(Some(&field_names[..]));
            return future::ready(Ok(values)).boxed();
        }

        let first_fields = options.first_fields.unwrap_or_else(|| {
            FirstFields::Only(
                field_names
                    .iter()
                    .filter(|name| state.store.get_field_meta(name).is_some_and(|m| m.validate_first))
                    .cloned()
                    .collect(),
            )
        });
        let (batch, notice) = self.snapshot(state, fields, None, options.force);
        drop(guard);
        self.notify_fields(notice);

        let pending = self.dispatch(
            batch,
            Some(field_names),
            ValidateOptions {
                first_fields,
                messages: self.config().validate_messages.clone(),
            },
        );
        async move { pending.await.into_result() }.boxed()
    }

    /// Snapshot step. Must run under the lock that the caller also used for
    /// any preceding writes of the same operation.
    pub(crate) fn snapshot(
        &self,
        state: &mut FormState,
        fields: Vec<FieldSnapshot>,
        action: Option<&str>,
        force: bool,
    ) -> (Batch, Option<FieldsNotice>) {
        let mut batch = Batch::default();
        let mut pending = IndexMap::new();
        for FieldSnapshot { name, record } in fields {
            if !force && !record.dirty {
                if let Some(errors) = &record.errors {
                    batch.carried.carry(&name, errors.clone());
                    continue;
                }
            }
            let Some(meta) = state.store.get_field_meta(&name) else {
                continue;
            };
            batch
                .rules
                .insert(name.clone(), ValidateGroup::rules_for_action(&meta.validate, action));
            pending.insert(
                name,
                FieldRecord {
                    errors: None,
                    validating: true,
                    dirty: true,
                    ..record
                },
            );
        }
        let notice = self.apply_fields(&mut state.store, pending);

        // Normalization may have rewritten what was just stored.
        for name in batch.rules.keys() {
            batch
                .values
                .insert(name.clone(), state.store.get_field_value(name));
        }
        (batch, notice)
    }

    /// Dispatch step. `field_names` selects the values reported on
    /// completion (every visible field when `None`).
    pub(crate) fn dispatch(
        &self,
        batch: Batch,
        field_names: Option<Vec<String>>,
        options: ValidateOptions,
    ) -> PendingValidation {
        if batch.rules.is_empty() {
            let values = self.lock().store.get_fields_value(field_names.as_deref());
            let errors = (!batch.carried.is_empty()).then_some(batch.carried);
            return PendingValidation::ready(BatchOutcome { errors, values });
        }

        let form = self.clone();
        let validator = self.validator();
        let request = ValidationRequest {
            rules: batch.rules.clone(),
            values: batch.values.clone(),
            options,
        };
        debug!(fields = request.rules.len(), "validation batch dispatched");
        PendingValidation::new(
            async move {
                let violations = validator.validate(request).await;
                form.reconcile(batch, violations, field_names)
            }
            .boxed(),
        )
    }

    fn reconcile(
        &self,
        batch: Batch,
        violations: Vec<Violation>,
        field_names: Option<Vec<String>>,
    ) -> BatchOutcome {
        let Batch {
            rules,
            values,
            carried,
        } = batch;
        let mut errors = carried;
        for violation in violations {
            let owner = owning_field(&rules, &violation.field);
            errors.push(&owner, violation);
        }

        let mut expired = Vec::new();
        let (notice, current_values) = {
            let mut state = self.lock();
            let mut settled = IndexMap::new();
            for (name, snapshot) in &values {
                if !state.store.has_field_meta(name) {
                    debug!(field = %name, "field cleared while validating");
                    continue;
                }
                if state.store.get_field_value(name) != *snapshot {
                    expired.push(name.clone());
                    continue;
                }
                let mut record = state.store.get_field(name).record;
                record.errors = errors.get(name).map(|e| e.errors.clone());
                record.validating = false;
                record.dirty = false;
                settled.insert(name.clone(), record);
            }
            let notice = self.apply_fields(&mut state.store, settled);
            (notice, state.store.get_fields_value(field_names.as_deref()))
        };
        self.notify_fields(notice);

        for name in &expired {
            errors.expire(name);
        }
        debug!(
            fields = values.len(),
            expired = expired.len(),
            "validation batch reconciled"
        );
        BatchOutcome {
            errors: (!errors.is_empty()).then_some(errors),
            values: current_values,
        }
    }
}

/// The field a violation belongs to: the field it names, or the array field
/// it is an element of (`list.2` belongs to `list` when `list` carries an
/// `array` rule).
fn owning_field(rules: &IndexMap<String, Vec<Rule>>, field: &str) -> String {
    rules
        .iter()
        .find(|(name, field_rules)| {
            name.as_str() == field
                || (field_rules.iter().any(Rule::is_array_rule) && is_element_path(name, field))
        })
        .map_or_else(|| field.to_string(), |(name, _)| name.clone())
}

fn is_element_path(owner: &str, path: &str) -> bool {
    path.strip_prefix(owner)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}
