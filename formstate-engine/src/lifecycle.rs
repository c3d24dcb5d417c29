//! Render tracking and mounting of bound controls.
//!
//! A field stays registered while it is rendered in the current pass, has a
//! mounted control, or is marked `preserve`. Anything else is dropped by the
//! sweep in [`Form::finish_render`]. Unmounting a control that is not
//! preserved clears its field but keeps a copy in the cleared-field cache,
//! which [`Form::recover_cleared_field`] (or the next mount, if no
//! registration came first) restores.

use crate::form::{Form, FormState};
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Opaque handle to the control bound to a field, supplied by the adapter.
pub type BindingHandle = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub(crate) struct Lifecycle {
    rendered: HashSet<String>,
    mounted: IndexMap<String, BindingHandle>,
}

impl Lifecycle {
    pub(crate) fn mark_rendered(&mut self, name: &str) {
        self.rendered.insert(name.to_string());
    }

    pub(crate) fn attach(&mut self, name: &str, handle: BindingHandle) {
        self.mounted.insert(name.to_string(), handle);
    }

    pub(crate) fn detach(&mut self, name: &str) {
        self.mounted.shift_remove(name);
    }

    pub(crate) fn instance(&self, name: &str) -> Option<BindingHandle> {
        self.mounted.get(name).cloned()
    }

    fn keeps(&self, name: &str) -> bool {
        self.rendered.contains(name) || self.mounted.contains_key(name)
    }
}

impl FormState {
    fn recover_cleared_field(&mut self, name: &str) -> bool {
        let Some(cleared) = self.store.take_cleared_field(name) else {
            return false;
        };
        self.store
            .set_fields(IndexMap::from([(name.to_string(), cleared.field)]));
        self.store.set_field_meta(name, cleared.meta);
        true
    }
}

impl Form {
    /// Records that a control is bound to `name`, restoring the field from
    /// the cleared-field cache if an entry is still there.
    pub fn mount(&self, name: &str, handle: BindingHandle) {
        let mut state = self.lock();
        state.lifecycle.attach(name, handle);
        if state.recover_cleared_field(name) {
            debug!(field = %name, "cleared field recovered on mount");
        }
    }

    /// Records that the control bound to `name` went away. A field that is
    /// not preserved is cleared and cached.
    pub fn unmount(&self, name: &str) {
        let mut state = self.lock();
        let preserve = state.store.get_field_meta(name).map(|meta| meta.preserve);
        if preserve == Some(false) {
            state.store.cache_cleared_field(name);
            state.clear_field(name);
            debug!(field = %name, "field cleared on unmount");
        }
        state.lifecycle.detach(name);
    }

    /// Ends a render pass: clears every field that was neither rendered nor
    /// mounted nor preserved, then starts a new pass.
    pub fn finish_render(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let removed: Vec<String> = state
            .store
            .get_all_fields_name()
            .into_iter()
            .filter(|name| {
                !state.lifecycle.keeps(name)
                    && !state.store.get_field_meta(name).is_some_and(|meta| meta.preserve)
            })
            .collect();
        for name in &removed {
            state.clear_field(name);
        }
        state.lifecycle.rendered.clear();
        if !removed.is_empty() {
            debug!(cleared = removed.len(), "unrendered fields cleared");
        }
    }

    /// Restores `name` from the cleared-field cache. Returns false when
    /// there is nothing cached.
    pub fn recover_cleared_field(&self, name: &str) -> bool {
        self.lock().recover_cleared_field(name)
    }

    /// The control currently bound to `name`.
    pub fn get_field_instance(&self, name: &str) -> Option<BindingHandle> {
        self.lock().lifecycle.instance(name)
    }
}
