use formstate_store::{FieldMeta, FieldRecord, FieldTree, FieldsStore, NormalizeFn};
use formstate_validation::{Rule, ValidateGroup, Violation};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn registered(names: &[&str]) -> FieldsStore {
    let mut store = FieldsStore::default();
    for name in names {
        store.set_field_meta(name, FieldMeta::new(*name));
    }
    store
}

fn with_initial(name: &str, initial: Value) -> FieldMeta {
    FieldMeta {
        initial_value: Some(initial),
        ..FieldMeta::new(name)
    }
}

fn with_rules(name: &str) -> FieldMeta {
    FieldMeta {
        validate: vec![ValidateGroup::new(["onChange"], vec![Rule::required()])],
        ..FieldMeta::new(name)
    }
}

fn values(pairs: &[(&str, Value)]) -> IndexMap<String, FieldRecord> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), FieldRecord::with_value(value.clone())))
        .collect()
}

// ── Effective value ──────────────────────────────────────────────

#[test]
fn initial_value_is_used_until_a_value_is_collected() {
    let mut store = FieldsStore::default();
    store.set_field_meta("email", with_initial("email", json!("a@b.c")));
    assert_eq!(store.get_field_value("email"), json!("a@b.c"));

    store.set_fields(values(&[("email", json!("x@y.z"))]));
    assert_eq!(store.get_field_value("email"), json!("x@y.z"));
}

#[test]
fn explicit_null_overrides_initial_value() {
    let mut store = FieldsStore::default();
    store.set_field_meta("email", with_initial("email", json!("a@b.c")));
    store.set_fields(values(&[("email", Value::Null)]));
    assert_eq!(store.value_from_fields("email"), Some(Value::Null));
}

#[test]
fn unknown_field_reads_as_empty() {
    let store = FieldsStore::default();
    let snapshot = store.get_field("nowhere");
    assert_eq!(snapshot.name, "nowhere");
    assert_eq!(snapshot.record, FieldRecord::default());
    assert_eq!(store.get_field_value("nowhere"), Value::Null);
    assert!(!store.is_field_touched("nowhere"));
}

// ── Nested reads ─────────────────────────────────────────────────

#[test]
fn namespace_read_rebuilds_object() {
    let mut store = registered(&["user.name", "user.age", "title"]);
    store.set_fields(values(&[("user.name", json!("Ada")), ("user.age", json!(36))]));

    assert_eq!(store.get_field_value("user"), json!({"name": "Ada", "age": 36}));
    assert_eq!(
        store.get_all_values(),
        json!({"user": {"name": "Ada", "age": 36}, "title": null})
    );
}

#[test]
fn namespace_read_rebuilds_array() {
    let mut store = registered(&["tags[0]", "tags[1]"]);
    store.set_fields(values(&[("tags[0]", json!("a")), ("tags[1]", json!("b"))]));
    assert_eq!(store.get_field_value("tags"), json!(["a", "b"]));
}

#[test]
fn selected_fields_value_is_nested() {
    let mut store = registered(&["a.x", "a.y", "b"]);
    store.set_fields(values(&[("a.x", json!(1)), ("a.y", json!(2)), ("b", json!(3))]));
    assert_eq!(store.get_fields_value(Some(&["a.x", "b"][..])), json!({"a": {"x": 1}, "b": 3}));
}

#[test]
fn hidden_fields_are_left_out_of_bulk_reads() {
    let mut store = registered(&["shown"]);
    store.set_field_meta(
        "secret",
        FieldMeta {
            hidden: true,
            ..FieldMeta::new("secret")
        },
    );
    assert_eq!(store.get_valid_fields_name(), vec!["shown"]);
    assert_eq!(store.get_all_fields_name(), vec!["shown", "secret"]);
    assert_eq!(store.get_fields_value::<&str>(None), json!({"shown": null}));
}

#[test]
fn errors_are_read_as_messages() {
    let mut store = registered(&["user.name", "user.age"]);
    let mut fields = IndexMap::new();
    fields.insert(
        "user.name".to_string(),
        FieldRecord {
            errors: Some(vec![Violation::new("user.name", "name is required")]),
            ..FieldRecord::default()
        },
    );
    store.set_fields(fields);

    assert_eq!(store.get_field_error("user.name"), json!(["name is required"]));
    assert_eq!(
        store.get_field_error("user"),
        json!({"name": ["name is required"], "age": null})
    );
}

#[test]
fn oversized_indices_read_back_as_members() {
    let mut store = registered(&["a[18446744073709551615]", "b[100000000000]"]);
    store.set_fields(values(&[
        ("a[18446744073709551615]", json!("x")),
        ("b[100000000000]", json!("y")),
    ]));

    assert_eq!(
        store.get_all_values(),
        json!({"a": {"18446744073709551615": "x"}, "b": {"100000000000": "y"}})
    );
    assert_eq!(store.get_field_value("a[18446744073709551615]"), json!("x"));
    assert_eq!(
        store.get_fields_value::<&str>(None),
        json!({"a": {"18446744073709551615": "x"}, "b": {"100000000000": "y"}})
    );
    assert!(store.get_nested_all_fields().get("a[18446744073709551615]").is_some());
}

// ── Prefix invariant ─────────────────────────────────────────────

#[test]
fn nested_names_conflict_with_their_prefix() {
    let store = registered(&["a", "list[0]"]);
    assert!(!store.is_valid_nested_field_name("a.b"));
    assert!(!store.is_valid_nested_field_name("list"));
    assert!(store.is_valid_nested_field_name("ab"));
    assert!(store.is_valid_nested_field_name("a"));
}

#[test]
fn full_names_expand_partials() {
    let store = registered(&["user.name", "user.age", "username"]);
    assert_eq!(store.get_valid_fields_full_name(&["user"]), vec!["user.name", "user.age"]);
    assert_eq!(store.get_valid_fields_full_name(&["username"]), vec!["username"]);
}

// ── Writes ───────────────────────────────────────────────────────

#[test]
fn set_fields_replaces_whole_record() {
    let mut store = registered(&["a"]);
    let mut touched = IndexMap::new();
    touched.insert(
        "a".to_string(),
        FieldRecord {
            value: Some(json!(1)),
            touched: true,
            ..FieldRecord::default()
        },
    );
    store.set_fields(touched);
    store.set_fields(values(&[("a", json!(2))]));
    assert!(!store.is_field_touched("a"));
    assert_eq!(store.get_field_value("a"), json!(2));
}

#[test]
fn normalize_runs_on_set() {
    let upper: NormalizeFn = Arc::new(|value: &Value, _prev: &Value, _all: &IndexMap<String, Value>| match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        other => other.clone(),
    });
    let mut store = FieldsStore::default();
    store.set_field_meta(
        "code",
        FieldMeta {
            normalize: Some(upper),
            ..FieldMeta::new("code")
        },
    );
    store.set_fields(values(&[("code", json!("abc"))]));
    assert_eq!(store.get_field_value("code"), json!("ABC"));

    store.set_fields(values(&[("code", json!("ABC"))]));
    assert_eq!(store.get_field_value("code"), json!("ABC"));
}

#[test]
fn normalize_sees_previous_and_all_values() {
    let keep_max: NormalizeFn = Arc::new(|value: &Value, prev: &Value, all: &IndexMap<String, Value>| {
        let floor = all.get("floor").and_then(Value::as_i64).unwrap_or(0);
        let value = value.as_i64().unwrap_or(0).max(floor);
        json!(value.max(prev.as_i64().unwrap_or(0)))
    });
    let mut store = registered(&["floor"]);
    store.set_field_meta(
        "level",
        FieldMeta {
            normalize: Some(keep_max),
            ..FieldMeta::new("level")
        },
    );
    store.set_fields(values(&[("floor", json!(3)), ("level", json!(1))]));
    assert_eq!(store.get_field_value("level"), json!(3));

    store.set_fields(values(&[("level", json!(2))]));
    assert_eq!(store.get_field_value("level"), json!(3));
}

#[test]
fn dirty_only_marks_fields_with_rules() {
    let mut store = registered(&["plain"]);
    store.set_field_meta("checked", with_rules("checked"));
    store.set_fields(values(&[("plain", json!(1)), ("checked", json!(2))]));
    store.set_fields_as_dirty();

    assert!(!store.get_field("plain").record.dirty);
    assert!(store.get_field("checked").record.dirty);
}

#[test]
fn reset_returns_empty_records_for_collected_values() {
    let mut store = FieldsStore::default();
    store.set_field_meta("a", with_initial("a", json!("init")));
    store.set_field_meta("b", FieldMeta::new("b"));
    store.set_fields(values(&[("a", json!("changed"))]));

    let reset = store.reset_fields::<&str>(None);
    assert_eq!(reset.keys().collect::<Vec<_>>(), vec!["a"]);

    store.set_fields(reset);
    assert_eq!(store.get_field_value("a"), json!("init"));
}

#[test]
fn clear_field_forgets_record_and_meta() {
    let mut store = registered(&["a"]);
    store.set_fields(values(&[("a", json!(1))]));
    store.clear_field("a");
    assert!(!store.has_field_meta("a"));
    assert_eq!(store.get_field("a").record, FieldRecord::default());
}

#[test]
fn initial_values_apply_to_registered_paths() {
    let mut store = registered(&["user.name", "user.age"]);
    store.set_fields_initial_value(&json!({"user": {"name": "Ada", "extra": 1}}));
    assert_eq!(store.get_field_value("user.name"), json!("Ada"));
    assert_eq!(store.get_field_meta("user.age").and_then(|m| m.initial_value.clone()), None);
}

#[test]
fn value_props_use_value_prop_name() {
    let mut store = FieldsStore::default();
    let meta = FieldMeta {
        value_prop_name: "checked".to_string(),
        initial_value: Some(json!(true)),
        ..FieldMeta::new("agree")
    };
    store.set_field_meta("agree", meta.clone());
    let props = store.get_field_value_prop_value(&meta);
    assert_eq!(Value::Object(props), json!({"checked": true}));
}

// ── Ingest ───────────────────────────────────────────────────────

#[test]
fn field_tree_ingest_flattens_records() {
    let tree = FieldTree::from_records([
        ("user.name", FieldRecord::with_value(json!("Ada"))),
        ("tags[1]", FieldRecord::with_value(json!("b"))),
    ]);
    let store = FieldsStore::new(&tree);
    assert_eq!(store.get_field("user.name").record.value, Some(json!("Ada")));
    assert_eq!(store.get_field("tags[1]").record.value, Some(json!("b")));
}

#[test]
fn scalar_in_field_tree_is_skipped() {
    let mut children = IndexMap::new();
    children.insert("raw".to_string(), FieldTree::Scalar(json!(5)));
    children.insert("ok".to_string(), FieldTree::Field(FieldRecord::with_value(json!(1))));
    let store = FieldsStore::new(&FieldTree::Object(children));
    assert_eq!(store.get_field("raw").record.value, None);
    assert_eq!(store.get_field("ok").record.value, Some(json!(1)));
}

#[test]
fn not_collected_fields_carry_initial_values() {
    let mut store = FieldsStore::default();
    store.set_field_meta("a", with_initial("a", json!("init")));
    store.set_field_meta("b", FieldMeta::new("b"));
    store.set_fields(values(&[("b", json!(2))]));

    let pending = store.get_not_collected_fields();
    assert_eq!(pending.get("a").and_then(|r| r.value.clone()), Some(json!("init")));
    assert!(pending.get("b").is_none());

    let all = store.get_nested_all_fields();
    assert_eq!(all.get("b").and_then(|r| r.value.clone()), Some(json!(2)));
}

// ── Cleared-field cache ──────────────────────────────────────────

#[test]
fn cache_round_trip() {
    let mut store = registered(&["a"]);
    store.set_fields(values(&[("a", json!("kept"))]));
    store.cache_cleared_field("a");
    store.clear_field("a");
    assert!(store.has_cleared_field("a"));

    let cleared = store.take_cleared_field("a").expect("cached");
    assert_eq!(cleared.field.value, Some(json!("kept")));
    assert_eq!(cleared.meta.name, "a");
    assert!(!store.has_cleared_field("a"));
}

#[test]
fn registration_discards_cache_entry() {
    let mut store = registered(&["a"]);
    store.cache_cleared_field("a");
    store.set_field_meta("a", FieldMeta::new("a"));
    assert!(!store.has_cleared_field("a"));
}

#[test]
fn forget_all_empties_cache() {
    let mut store = registered(&["a", "b"]);
    store.cache_cleared_field("a");
    store.cache_cleared_field("b");
    store.forget_cleared_field("a");
    assert!(!store.has_cleared_field("a"));
    store.forget_all_cleared();
    assert!(!store.has_cleared_field("b"));
}
