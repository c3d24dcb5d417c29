//! Form state engine.
//!
//! Owns the state of a dynamically registered set of nested form fields,
//! collects new values from UI events, and runs asynchronous rule-based
//! validation over that state. A rendering adapter sits on top: it registers
//! fields while rendering, forwards control events to [`Form::collect`],
//! reports mounts and unmounts, and reads values and errors back.
//!
//! # Architecture
//!
//! - **Store** ([`formstate_store`]): records and metadata keyed by path
//! - **Collection** ([`Form::collect`]): turns an event into a stored value,
//!   optionally starting a validation batch
//! - **Validation** ([`Form::validate_fields`]): snapshot, dispatch to a
//!   [`RuleValidator`], reconcile, with stale results discarded
//! - **Lifecycle** ([`Form::mount`], [`Form::unmount`],
//!   [`Form::finish_render`]): which fields stay registered
//!
//! # Example
//!
//! ```
//! use formstate_engine::{FieldOptions, Form, FormConfig, Rule};
//! use serde_json::json;
//!
//! let form = Form::new(FormConfig::default());
//! form.register_field(
//!     "user.name",
//!     FieldOptions::new()
//!         .rules(vec![Rule::required()])
//!         .initial_value(json!("Ann")),
//! )
//! .unwrap();
//!
//! assert_eq!(form.get_fields_value::<&str>(None), json!({"user": {"name": "Ann"}}));
//! ```

mod collect;
mod config;
mod error;
mod event;
mod form;
mod lifecycle;
mod options;
mod scroll;
mod validation;

pub use collect::{Collected, PendingValidation};
pub use config::{FieldsChangeFn, FormConfig, FormHooks, ValuesChangeFn};
pub use error::{FormError, FormResult, ValidationFailure};
pub use event::value_from_event;
pub use form::Form;
pub use lifecycle::BindingHandle;
pub use options::{Binding, FieldOptions, InputProps};
pub use scroll::{ErrorScroller, ScrollingForm};
pub use validation::{BatchOutcome, FieldErrors, ValidateFieldsOptions, ValidationErrors};

pub use formstate_store::{FieldMeta, FieldRecord, FieldSnapshot, FieldTree};
pub use formstate_validation::{
    FirstFields, Rule, RuleSetValidator, RuleType, RuleValidator, ValidateGroup,
    ValidateMessages, ValidationRequest, Violation,
};
