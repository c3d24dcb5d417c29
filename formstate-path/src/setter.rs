//! Structural get/set over `serde_json::Value` trees.

use crate::segment::{parse_path, Segment};
use serde_json::{Map, Value};

/// Writes `leaf` at `path` inside `root`, creating intermediate containers.
///
/// A missing (or scalar) intermediate becomes an array when the following
/// segment is an index and an object otherwise. Arrays are padded with
/// `null` up to the written index. An empty path replaces `root`.
pub fn set_path(root: &mut Value, path: &str, leaf: Value) {
    let segments = parse_path(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = leaf;
        return;
    };

    let mut node = root;
    for (i, segment) in parents.iter().enumerate() {
        let next = &segments[i + 1];
        let child = child_slot(node, segment);
        if !(child.is_object() || child.is_array()) {
            *child = empty_container_for(next);
        }
        node = child;
    }
    *child_slot(node, last) = leaf;
}

/// Reads the value at `path`, if every step exists.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    parse_path(path)
        .iter()
        .try_fold(root, |node, segment| match node {
            Value::Array(items) => segment.as_index().and_then(|i| items.get(i)),
            Value::Object(map) => map.get(&*segment.as_key()),
            _ => None,
        })
}

/// Rebuilds a nested tree from flat `path -> value` pairs.
///
/// Pairs are applied in iteration order, so a later pair wins when two
/// paths address the same location.
pub fn unflatten<I, P>(pairs: I) -> Value
where
    I: IntoIterator<Item = (P, Value)>,
    P: AsRef<str>,
{
    let mut root = Value::Object(Map::new());
    for (path, value) in pairs {
        set_path(&mut root, path.as_ref(), value);
    }
    root
}

fn empty_container_for(next: &Segment) -> Value {
    if next.as_index().is_some() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Returns the slot `segment` addresses inside `node`, creating it if needed.
fn child_slot<'a>(node: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match (node, segment.as_index()) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (node, _) => ensure_object(node)
            .entry(segment.as_key().into_owned())
            .or_insert(Value::Null),
    }
}

/// Coerces `node` into an object. Array elements keep their positions as
/// string keys; scalars are dropped.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        let previous = std::mem::take(node);
        let map = match previous {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Map::new(),
        };
        *node = Value::Object(map);
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was coerced into an object above"),
    }
}
