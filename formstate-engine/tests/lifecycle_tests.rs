use formstate_engine::{
    BindingHandle, ErrorScroller, FieldOptions, Form, FormConfig, Rule, ScrollingForm,
    ValidateFieldsOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_form() -> Form {
    init_tracing();
    Form::new(FormConfig::default())
}

fn handle(label: &str) -> BindingHandle {
    Arc::new(label.to_string())
}

#[derive(Default)]
struct RecordingScroller {
    scrolled: Mutex<Vec<(String, String)>>,
}

impl ErrorScroller for RecordingScroller {
    fn scroll_to(&self, name: &str, handle: &BindingHandle) {
        let label = handle.downcast_ref::<String>().cloned().unwrap_or_default();
        self.scrolled.lock().unwrap().push((name.to_string(), label));
    }
}

// ── Mount / unmount ──────────────────────────────────────────────

#[test]
fn mount_records_the_instance() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.mount("a", handle("input-a"));

    let instance = form.get_field_instance("a").unwrap();
    assert_eq!(instance.downcast_ref::<String>().map(String::as_str), Some("input-a"));
    assert!(form.get_field_instance("b").is_none());
}

#[test]
fn unmount_clears_and_caches() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.mount("a", handle("input-a"));
    form.set_fields_value(&json!({"a": "typed"}));

    form.unmount("a");
    assert!(form.get_field_meta("a").is_none());
    assert!(form.get_field_instance("a").is_none());
    assert_eq!(form.get_field_value("a"), Value::Null);
    assert_eq!(form.get_all_values(), json!({}));

    assert!(form.recover_cleared_field("a"));
    assert_eq!(form.get_field_value("a"), json!("typed"));
    assert!(form.get_field_meta("a").is_some());
    assert!(!form.recover_cleared_field("a"));
}

#[test]
fn mount_without_registration_recovers() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.set_fields_value(&json!({"a": 1}));
    form.unmount("a");

    form.mount("a", handle("input-a"));
    assert_eq!(form.get_field_value("a"), json!(1));
    assert!(form.get_field_instance("a").is_some());
}

#[test]
fn registration_discards_cached_state() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.set_fields_value(&json!({"a": 1}));
    form.unmount("a");

    form.register_field("a", FieldOptions::new()).unwrap();
    form.mount("a", handle("input-a"));
    assert_eq!(form.get_field_value("a"), Value::Null);
    assert!(!form.recover_cleared_field("a"));
}

#[test]
fn preserved_fields_survive_unmount() {
    let form = make_form();
    form.register_field("a", FieldOptions::new().preserve()).unwrap();
    form.mount("a", handle("input-a"));
    form.set_fields_value(&json!({"a": "kept"}));

    form.unmount("a");
    assert_eq!(form.get_field_value("a"), json!("kept"));
    assert!(form.get_field_instance("a").is_none());
    assert!(!form.recover_cleared_field("a"));
}

#[test]
fn unmounting_an_unknown_field_is_harmless() {
    let form = make_form();
    form.unmount("ghost");
    assert!(!form.recover_cleared_field("ghost"));
}

#[test]
fn reset_forgets_cleared_fields() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.register_field("b", FieldOptions::new()).unwrap();
    form.set_fields_value(&json!({"a": 1, "b": 2}));
    form.unmount("a");
    form.unmount("b");

    form.reset_fields(Some(&["a"][..]));
    assert!(!form.recover_cleared_field("a"));
    assert!(form.recover_cleared_field("b"));

    form.unmount("b");
    form.reset_fields::<&str>(None);
    assert!(!form.recover_cleared_field("b"));
}

// ── Render sweep ─────────────────────────────────────────────────

#[test]
fn finish_render_drops_unrendered_fields() {
    let form = make_form();
    form.register_field("a", FieldOptions::new()).unwrap();
    form.register_field("b", FieldOptions::new()).unwrap();
    form.finish_render();
    assert!(form.get_field_meta("a").is_some());
    assert!(form.get_field_meta("b").is_some());

    form.register_field("a", FieldOptions::new()).unwrap();
    form.finish_render();
    assert!(form.get_field_meta("a").is_some());
    assert!(form.get_field_meta("b").is_none());
}

#[test]
fn finish_render_keeps_mounted_and_preserved_fields() {
    let form = make_form();
    form.register_field("mounted", FieldOptions::new()).unwrap();
    form.register_field("kept", FieldOptions::new().preserve()).unwrap();
    form.register_field("gone", FieldOptions::new()).unwrap();
    form.mount("mounted", handle("input"));
    form.finish_render();

    form.finish_render();
    assert!(form.get_field_meta("mounted").is_some());
    assert!(form.get_field_meta("kept").is_some());
    assert!(form.get_field_meta("gone").is_none());
}

// ── Scroll to first error ────────────────────────────────────────

#[tokio::test]
async fn scrolls_to_first_mounted_invalid_field() {
    let form = ScrollingForm::new(make_form());
    for name in ["a", "b", "c"] {
        form.register_field(name, FieldOptions::new().rules(vec![Rule::required()]))
            .unwrap();
    }
    form.mount("b", handle("input-b"));
    form.mount("c", handle("input-c"));
    let scroller = RecordingScroller::default();

    let failure = form
        .validate_fields_and_scroll::<&str>(None, ValidateFieldsOptions::default(), &scroller)
        .await
        .unwrap_err();

    assert_eq!(failure.errors.len(), 3);
    assert_eq!(
        *scroller.scrolled.lock().unwrap(),
        vec![("b".to_string(), "input-b".to_string())]
    );
}

#[tokio::test]
async fn valid_forms_do_not_scroll() {
    let form = ScrollingForm::from(make_form());
    form.register_field(
        "a",
        FieldOptions::new()
            .rules(vec![Rule::required()])
            .initial_value(json!("set")),
    )
    .unwrap();
    form.mount("a", handle("input-a"));
    let scroller = RecordingScroller::default();

    let values = form
        .validate_fields_and_scroll::<&str>(None, ValidateFieldsOptions::default(), &scroller)
        .await
        .unwrap();

    assert_eq!(values, json!({"a": "set"}));
    assert!(scroller.scrolled.lock().unwrap().is_empty());
}
