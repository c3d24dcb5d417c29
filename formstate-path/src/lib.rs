//! Path codec for nested form values.
//!
//! A form field is identified by a path string such as
//! `"user.addresses[0].city"`: `.` selects an object member and `[i]` an
//! array element. This crate converts between the two shapes the rest of
//! the engine needs:
//!
//! - [`flatten`]: nested tree → flat `path -> leaf` map, with a
//!   caller-supplied leaf predicate
//! - [`unflatten`]: flat `path -> value` pairs → nested `serde_json::Value`
//!
//! plus the low-level helpers both directions are built on
//! ([`parse_path`], [`set_path`], [`get_path`], [`is_part_of`]).
//!
//! # Leaf predicates
//!
//! The same traversal serves two different callers. Ingesting externally
//! supplied field records treats "is this node a field record" as the leaf
//! test, while accepting a partial value update treats "is this path already
//! registered" as the leaf test. The predicate receives both the path and
//! the node so either style works.

mod segment;
mod setter;
mod tree;

pub use segment::{is_part_of, join_index, join_key, parse_path, Segment, MAX_INDEX};
pub use setter::{get_path, set_path, unflatten};
pub use tree::{flatten, Flattened, NodeView, TreeNode};
