//! Collection of new values from UI events.

use crate::error::{FormError, FormResult};
use crate::event::value_from_event;
use crate::form::{Form, ValuesNotice};
use crate::options::Binding;
use crate::validation::BatchOutcome;
use formstate_path::set_path;
use formstate_store::{FieldMeta, FieldRecord, FieldSnapshot};
use formstate_validation::{validate_triggers, FirstFields, ValidateOptions};
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::warn;

/// A validation batch that has been snapshotted but not yet reconciled.
///
/// The fields it covers are already marked `validating`. Await it (or spawn
/// it) to dispatch to the validator and reconcile the result; dropping it
/// leaves those fields `validating` until they are validated again.
#[must_use = "validation only completes when the future is polled"]
pub struct PendingValidation {
    inner: BoxFuture<'static, BatchOutcome>,
}

impl PendingValidation {
    pub(crate) fn new(inner: BoxFuture<'static, BatchOutcome>) -> Self {
        Self { inner }
    }

    pub(crate) fn ready(outcome: BatchOutcome) -> Self {
        Self::new(future::ready(outcome).boxed())
    }
}

impl Future for PendingValidation {
    type Output = BatchOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<BatchOutcome> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingValidation").finish_non_exhaustive()
    }
}

/// Result of [`Form::collect`].
#[derive(Debug)]
pub enum Collected {
    /// The value was stored; no validation was triggered.
    Committed,
    /// The value was stored and a single-field validation started.
    Validating(PendingValidation),
}

impl Collected {
    /// Returns true if a validation batch was started.
    pub fn is_validating(&self) -> bool {
        matches!(self, Collected::Validating(_))
    }

    /// The started batch, if any.
    pub fn into_pending(self) -> Option<PendingValidation> {
        match self {
            Collected::Committed => None,
            Collected::Validating(pending) => Some(pending),
        }
    }
}

/// How `action` is handled for a field, if the field is bound to it.
pub(crate) fn binding_for(meta: &FieldMeta, action: &str) -> Option<Binding> {
    if validate_triggers(&meta.validate).iter().any(|t| t == action) {
        Some(Binding::CollectValidate)
    } else if meta.trigger == action {
        Some(Binding::Collect)
    } else {
        None
    }
}

impl Form {
    /// Collects a new value for `name` from the arguments of `action`.
    ///
    /// The field's own handler for `action` runs first. The value is then
    /// extracted, stored as touched, and every field with rules is marked
    /// dirty. When `action` is one of the field's validate triggers, a
    /// single-field validation batch is started and returned.
    ///
    /// The handler and value extractor run without the form locked. If they
    /// unregister the field, the collected value is dropped with a warning.
    pub fn collect(&self, name: &str, action: &str, args: &[Value]) -> FormResult<Collected> {
        let meta = self
            .lock()
            .store
            .get_field_meta(name)
            .cloned()
            .ok_or_else(|| FormError::NotRegistered {
                name: name.to_string(),
            })?;
        let binding = binding_for(&meta, action).ok_or_else(|| FormError::UnboundAction {
            name: name.to_string(),
            action: action.to_string(),
        })?;

        if let Some(handler) = meta.handlers.get(action) {
            handler(args);
        }
        let value = match &meta.get_value_from_event {
            Some(extract) => extract(args),
            None => value_from_event(args),
        };

        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.store.has_field_meta(name) {
            warn!(field = %name, "field unregistered while collecting, value dropped");
            return Ok(Collected::Committed);
        }
        let values_notice = match self.hooks().on_values_change {
            Some(_) if value != state.store.get_field_value(name) => {
                let mut changed = Value::Object(Map::new());
                set_path(&mut changed, name, value.clone());
                let mut all = state.store.get_all_values();
                set_path(&mut all, name, value.clone());
                Some(ValuesNotice { changed, all })
            }
            _ => None,
        };

        let field = FieldRecord {
            value: Some(value),
            touched: true,
            ..state.store.get_field(name).record
        };
        state.store.set_fields_as_dirty();

        match binding {
            Binding::Collect => {
                let field = FieldRecord {
                    dirty: meta.has_rules(),
                    ..field
                };
                let notice = self.apply_fields(&mut state.store, IndexMap::from([(name.to_string(), field)]));
                drop(guard);
                self.notify_values(values_notice);
                self.notify_fields(notice);
                Ok(Collected::Committed)
            }
            Binding::CollectValidate => {
                let field = FieldRecord { dirty: true, ..field };
                let (batch, notice) = self.snapshot(
                    state,
                    vec![FieldSnapshot::new(name, field)],
                    Some(action),
                    false,
                );
                drop(guard);
                self.notify_values(values_notice);
                self.notify_fields(notice);
                let options = ValidateOptions {
                    first_fields: FirstFields::All(meta.validate_first),
                    messages: self.config().validate_messages.clone(),
                };
                Ok(Collected::Validating(self.dispatch(batch, None, options)))
            }
        }
    }
}
