use serde::{Deserialize, Serialize};

/// One failed rule, as reported by a [`RuleValidator`](crate::RuleValidator).
///
/// `field` may be a sub-path of the validated field (`list.2`) when the
/// rule targets array elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
    /// Which check failed (`required`, `type`, `range`, ...), when known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Violation {
    /// A violation of `field` with `message`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind: None,
        }
    }

    /// Records which check failed.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}
