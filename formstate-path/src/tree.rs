//! Depth-first flattening of nested trees.

use crate::segment::{join_index, join_key};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

/// Structural view of one tree node, as seen by [`flatten`].
pub enum NodeView<'a, N> {
    /// Nothing to descend into (`null`).
    Empty,
    /// An ordered sequence; children are addressed as `path[i]`.
    Seq(&'a [N]),
    /// A keyed mapping; children are addressed as `path.key`.
    Map(Vec<(&'a str, &'a N)>),
    /// A scalar that is not a leaf: the tree is malformed at this point.
    Scalar,
}

/// A nested structure that [`flatten`] can walk.
pub trait TreeNode: Sized {
    /// Classifies this node for traversal.
    fn view(&self) -> NodeView<'_, Self>;
}

impl TreeNode for Value {
    fn view(&self) -> NodeView<'_, Self> {
        match self {
            Value::Null => NodeView::Empty,
            Value::Array(items) => NodeView::Seq(items),
            Value::Object(map) => NodeView::Map(map.iter().map(|(k, v)| (k.as_str(), v)).collect()),
            _ => NodeView::Scalar,
        }
    }
}

/// Result of [`flatten`].
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened<N> {
    /// Leaves in traversal order, keyed by path.
    pub leaves: IndexMap<String, N>,
    /// Paths of branches that ended in an unexpected scalar and were skipped.
    pub malformed: Vec<String>,
}

impl<N> Default for Flattened<N> {
    fn default() -> Self {
        Self {
            leaves: IndexMap::new(),
            malformed: Vec::new(),
        }
    }
}

/// Flattens `tree` into `path -> leaf` pairs.
///
/// At every node, `is_leaf(path, node)` is asked first; a leaf is recorded
/// and not descended into. Otherwise `null` is skipped, sequences and
/// mappings are descended into, and any other scalar is reported with
/// `diagnostic` and skipped. A malformed branch never aborts the rest of
/// the traversal.
pub fn flatten<N, F>(tree: &N, is_leaf: F, diagnostic: &str) -> Flattened<N>
where
    N: TreeNode + Clone,
    F: Fn(&str, &N) -> bool,
{
    let mut out = Flattened::default();
    walk(String::new(), tree, &is_leaf, diagnostic, &mut out);
    out
}

fn walk<N, F>(path: String, node: &N, is_leaf: &F, diagnostic: &str, out: &mut Flattened<N>)
where
    N: TreeNode + Clone,
    F: Fn(&str, &N) -> bool,
{
    if is_leaf(&path, node) {
        out.leaves.insert(path, node.clone());
        return;
    }
    match node.view() {
        NodeView::Empty => {}
        NodeView::Seq(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(join_index(&path, i), item, is_leaf, diagnostic, out);
            }
        }
        NodeView::Map(entries) => {
            for (key, child) in entries {
                walk(join_key(&path, key), child, is_leaf, diagnostic, out);
            }
        }
        NodeView::Scalar => {
            warn!(path = %path, "{}", diagnostic);
            out.malformed.push(path);
        }
    }
}
