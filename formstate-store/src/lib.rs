//! Field store for formstate.
//!
//! Holds, per registered field path, the current [`FieldRecord`] (value,
//! touched, dirty, validating, errors) and its [`FieldMeta`] (rules,
//! triggers, initial value, flags), plus a cache of recently cleared fields
//! so a field that unmounts and remounts under the same path can get its
//! state back.
//!
//! A path counts as registered once metadata exists for it. Until a value
//! has been collected, a registered field's effective value is its
//! metadata's `initial_value`.
//!
//! All operations are synchronous and assume a single writer; the engine
//! crate serializes access.

mod meta;
mod record;
mod store;

pub use meta::{
    ClearedField, EventHandler, FieldMeta, GetValueFromEventFn, GetValuePropsFn, NormalizeFn,
    DEFAULT_TRIGGER, DEFAULT_VALUE_PROP_NAME,
};
pub use record::{FieldRecord, FieldSnapshot, FieldTree};
pub use store::FieldsStore;
