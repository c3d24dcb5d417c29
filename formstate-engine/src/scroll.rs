//! Bulk validation that brings the first invalid field into view.

use crate::error::ValidationFailure;
use crate::form::Form;
use crate::lifecycle::BindingHandle;
use crate::validation::{ValidateFieldsOptions, ValidationErrors};
use serde_json::Value;
use std::ops::Deref;

/// Brings a bound control into view. Implemented by the adapter.
pub trait ErrorScroller: Send + Sync {
    fn scroll_to(&self, name: &str, handle: &BindingHandle);
}

/// A [`Form`] that scrolls to the first invalid field after validating.
///
/// Every other operation is delegated to the wrapped form.
#[derive(Debug, Clone)]
pub struct ScrollingForm {
    form: Form,
}

impl ScrollingForm {
    /// Wraps `form`.
    pub fn new(form: Form) -> Self {
        Self { form }
    }

    /// The wrapped form.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Validates like [`Form::validate_fields`]; on failure, hands the first
    /// invalid field (in registration order) that has a mounted control to
    /// `scroller`. The validation result is returned unchanged.
    pub async fn validate_fields_and_scroll<S: AsRef<str>>(
        &self,
        names: Option<&[S]>,
        options: ValidateFieldsOptions,
        scroller: &dyn ErrorScroller,
    ) -> Result<Value, ValidationFailure> {
        let result = self.form.validate_fields(names, options).await;
        if let Err(failure) = &result {
            if let Some((name, handle)) = self.first_mounted_error(&failure.errors) {
                scroller.scroll_to(&name, &handle);
            }
        }
        result
    }

    fn first_mounted_error(&self, errors: &ValidationErrors) -> Option<(String, BindingHandle)> {
        let state = self.form.lock();
        state
            .store
            .get_valid_fields_name()
            .into_iter()
            .filter(|name| errors.contains(name))
            .find_map(|name| state.lifecycle.instance(&name).map(|handle| (name, handle)))
    }
}

impl Deref for ScrollingForm {
    type Target = Form;

    fn deref(&self) -> &Form {
        &self.form
    }
}

impl From<Form> for ScrollingForm {
    fn from(form: Form) -> Self {
        Self::new(form)
    }
}
