use formstate_path::{
    flatten, get_path, is_part_of, join_index, join_key, parse_path, set_path, unflatten, Segment,
    MAX_INDEX,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn is_scalar(_: &str, node: &Value) -> bool {
    !node.is_object() && !node.is_array()
}

// ── parse_path ───────────────────────────────────────────────────

#[test]
fn parse_dotted_and_bracketed() {
    assert_eq!(
        parse_path("user.addresses[0].city"),
        vec![
            Segment::Key("user".into()),
            Segment::Key("addresses".into()),
            Segment::Index(0),
            Segment::Key("city".into()),
        ]
    );
}

#[test]
fn parse_skips_empty_members() {
    assert_eq!(
        parse_path("a..b."),
        vec![Segment::Key("a".into()), Segment::Key("b".into())]
    );
}

#[test]
fn parse_quoted_bracket_key() {
    assert_eq!(
        parse_path("a[\"b\"]"),
        vec![Segment::Key("a".into()), Segment::Key("b".into())]
    );
}

#[test]
fn parse_unclosed_bracket_keeps_remainder() {
    assert_eq!(
        parse_path("a[1"),
        vec![Segment::Key("a".into()), Segment::Key("[1".into())]
    );
}

#[test]
fn parse_empty_path() {
    assert!(parse_path("").is_empty());
}

#[test]
fn numeric_key_counts_as_index() {
    assert_eq!(Segment::Key("2".into()).as_index(), Some(2));
    assert_eq!(Segment::Key("02".into()).as_index(), None);
    assert_eq!(Segment::Key("x".into()).as_index(), None);
    assert_eq!(Segment::Index(4).as_key(), "4");
}

#[test]
fn oversized_indices_become_keys() {
    assert_eq!(
        parse_path("a[18446744073709551615]"),
        vec![Segment::Key("a".into()), Segment::Key("18446744073709551615".into())]
    );
    assert_eq!(
        parse_path("a[99999999999999999999999]"),
        vec![Segment::Key("a".into()), Segment::Key("99999999999999999999999".into())]
    );
    assert_eq!(parse_path("a[65535]")[1], Segment::Index(MAX_INDEX));
    assert_eq!(Segment::Index(MAX_INDEX + 1).as_index(), None);
    assert_eq!(Segment::Key("100000000000".into()).as_index(), None);
}

#[test]
fn oversized_indices_are_written_as_object_members() {
    let mut root = json!({});
    set_path(&mut root, "a[18446744073709551615]", json!(1));
    set_path(&mut root, "b[100000000000].c", json!(2));
    set_path(&mut root, "d.4294967296", json!(3));
    assert_eq!(
        root,
        json!({
            "a": {"18446744073709551615": 1},
            "b": {"100000000000": {"c": 2}},
            "d": {"4294967296": 3},
        })
    );
    assert_eq!(get_path(&root, "a[18446744073709551615]"), Some(&json!(1)));
}

#[test]
fn oversized_index_into_existing_array_keeps_elements() {
    let mut root = json!({"list": ["x"]});
    set_path(&mut root, "list[18446744073709551615]", json!("y"));
    assert_eq!(root, json!({"list": {"0": "x", "18446744073709551615": "y"}}));
}

#[test]
fn join_helpers() {
    assert_eq!(join_key("", "a"), "a");
    assert_eq!(join_key("a", "b"), "a.b");
    assert_eq!(join_index("a", 3), "a[3]");
}

// ── is_part_of ───────────────────────────────────────────────────

#[test]
fn part_of_requires_separator() {
    assert!(is_part_of("a", "a.b"));
    assert!(is_part_of("a", "a[0]"));
    assert!(!is_part_of("a", "ab"));
    assert!(!is_part_of("a", "a"));
    assert!(!is_part_of("a.b", "a"));
}

// ── set_path / get_path ──────────────────────────────────────────

#[test]
fn set_creates_objects_and_arrays() {
    let mut root = json!({});
    set_path(&mut root, "user.tags[1]", json!("b"));
    assert_eq!(root, json!({"user": {"tags": [null, "b"]}}));
}

#[test]
fn set_dotted_index_creates_array() {
    let mut root = json!({});
    set_path(&mut root, "list.0", json!(1));
    assert_eq!(root, json!({"list": [1]}));
}

#[test]
fn set_replaces_scalar_intermediate() {
    let mut root = json!({"a": 5});
    set_path(&mut root, "a.b", json!(true));
    assert_eq!(root, json!({"a": {"b": true}}));
}

#[test]
fn set_key_on_array_turns_it_into_object() {
    let mut root = json!({"a": [1]});
    set_path(&mut root, "a.x", json!(2));
    assert_eq!(root, json!({"a": {"0": 1, "x": 2}}));
}

#[test]
fn set_empty_path_replaces_root() {
    let mut root = json!({"a": 1});
    set_path(&mut root, "", json!("x"));
    assert_eq!(root, json!("x"));
}

#[test]
fn get_walks_objects_and_arrays() {
    let root = json!({"a": [{"b": 1}, {"b": 2}]});
    assert_eq!(get_path(&root, "a[1].b"), Some(&json!(2)));
    assert_eq!(get_path(&root, "a.0.b"), Some(&json!(1)));
    assert_eq!(get_path(&root, "a[2].b"), None);
    assert_eq!(get_path(&root, "a[0].b.c"), None);
}

// ── flatten ──────────────────────────────────────────────────────

#[test]
fn flatten_nested_tree() {
    let tree = json!({"user": {"name": "Ann", "tags": ["x", "y"]}, "ok": true});
    let flat = flatten(&tree, is_scalar, "unexpected");
    let paths: Vec<&str> = flat.leaves.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["user.name", "user.tags[0]", "user.tags[1]", "ok"]);
    assert_eq!(flat.leaves["user.tags[1]"], json!("y"));
    assert!(flat.malformed.is_empty());
}

#[test]
fn flatten_stops_at_leaf_predicate() {
    let tree = json!({"a": {"b": {"c": 1}}, "d": 2});
    let flat = flatten(&tree, |path, _| path == "a.b" || path == "d", "unexpected");
    assert_eq!(flat.leaves["a.b"], json!({"c": 1}));
    assert_eq!(flat.leaves["d"], json!(2));
    assert_eq!(flat.leaves.len(), 2);
}

#[test]
fn flatten_skips_nulls() {
    let tree = json!({"a": null, "b": 1});
    let flat = flatten(&tree, |path, _| path == "b", "unexpected");
    assert_eq!(flat.leaves.len(), 1);
    assert!(flat.malformed.is_empty());
}

#[test]
fn flatten_reports_malformed_branch_and_continues() {
    let tree = json!({"a": 1, "b": {"c": 2}});
    let flat = flatten(&tree, |path, _| path == "b.c", "not a field");
    assert_eq!(flat.malformed, vec!["a".to_string()]);
    assert_eq!(flat.leaves["b.c"], json!(2));
}

// ── unflatten ────────────────────────────────────────────────────

#[test]
fn unflatten_rebuilds_tree() {
    let tree = unflatten([
        ("user.name", json!("Ann")),
        ("user.age", json!(3)),
        ("list[1]", json!("b")),
        ("list[0]", json!("a")),
    ]);
    assert_eq!(
        tree,
        json!({"user": {"name": "Ann", "age": 3}, "list": ["a", "b"]})
    );
}

#[test]
fn unflatten_of_flatten_round_trips() {
    let tree = json!({"a": [{"b": 1}, {"b": [true, "x"]}], "c": {"d": null}});
    let flat = flatten(&tree, is_scalar, "unexpected");
    assert_eq!(unflatten(flat.leaves), tree);
}
