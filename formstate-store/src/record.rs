use formstate_path::{parse_path, NodeView, Segment, TreeNode};
use formstate_validation::Violation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current state of one field.
///
/// `value: None` means nothing has been collected yet, which is different
/// from an explicit JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub touched: bool,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub validating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Violation>>,
}

impl FieldRecord {
    /// A record holding only `value`.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Error messages, in arrival order.
    pub fn error_messages(&self) -> Option<Vec<String>> {
        self.errors
            .as_ref()
            .map(|errors| errors.iter().map(|e| e.message.clone()).collect())
    }
}

/// A field record together with the path it was read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub record: FieldRecord,
}

impl FieldSnapshot {
    /// Pairs `record` with its path.
    pub fn new(name: impl Into<String>, record: FieldRecord) -> Self {
        Self {
            name: name.into(),
            record,
        }
    }
}

/// Nested field input.
///
/// Distinguishes processed field records from the structure around them,
/// so ingesting nested data never has to guess whether a plain object is a
/// record or a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldTree {
    Field(FieldRecord),
    Object(IndexMap<String, FieldTree>),
    Array(Vec<FieldTree>),
    #[default]
    Empty,
    /// Raw data where a record or namespace was expected.
    Scalar(Value),
}

impl FieldTree {
    /// An empty namespace.
    pub fn object() -> Self {
        FieldTree::Object(IndexMap::new())
    }

    /// Builds a tree from `path -> record` pairs.
    pub fn from_records<I, P>(records: I) -> Self
    where
        I: IntoIterator<Item = (P, FieldRecord)>,
        P: AsRef<str>,
    {
        let mut tree = FieldTree::object();
        for (path, record) in records {
            tree.insert(path.as_ref(), record);
        }
        tree
    }

    /// Places `record` at `path`, creating intermediate namespaces.
    ///
    /// An intermediate that is not a namespace of the right kind (object for
    /// member access, array for index access) is replaced.
    pub fn insert(&mut self, path: &str, record: FieldRecord) {
        let mut node = self;
        for segment in parse_path(path) {
            node = node.child_mut(&segment);
        }
        *node = FieldTree::Field(record);
    }

    /// Returns the record at `path`, if one was placed there.
    pub fn get(&self, path: &str) -> Option<&FieldRecord> {
        let mut node = self;
        for segment in parse_path(path) {
            node = match (node, segment.as_index()) {
                (FieldTree::Array(items), Some(i)) => items.get(i)?,
                (FieldTree::Object(map), _) => map.get(&*segment.as_key())?,
                _ => return None,
            };
        }
        match node {
            FieldTree::Field(record) => Some(record),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &Segment) -> &mut FieldTree {
        let index = segment.as_index();
        let fits = matches!(
            (&*self, index),
            (FieldTree::Array(_), Some(_)) | (FieldTree::Object(_), _)
        );
        if !fits {
            *self = match index {
                Some(_) => FieldTree::Array(Vec::new()),
                None => FieldTree::object(),
            };
        }
        match (self, index) {
            (FieldTree::Array(items), Some(i)) => {
                if items.len() <= i {
                    items.resize(i + 1, FieldTree::Empty);
                }
                &mut items[i]
            }
            (FieldTree::Object(map), _) => map
                .entry(segment.as_key().into_owned())
                .or_insert(FieldTree::Empty),
            _ => unreachable!("node was shaped for this segment above"),
        }
    }
}

impl From<FieldRecord> for FieldTree {
    fn from(record: FieldRecord) -> Self {
        FieldTree::Field(record)
    }
}

impl TreeNode for FieldTree {
    fn view(&self) -> NodeView<'_, Self> {
        match self {
            FieldTree::Empty => NodeView::Empty,
            FieldTree::Array(items) => NodeView::Seq(items),
            FieldTree::Object(map) => NodeView::Map(map.iter().map(|(k, v)| (k.as_str(), v)).collect()),
            FieldTree::Field(_) | FieldTree::Scalar(_) => NodeView::Scalar,
        }
    }
}
