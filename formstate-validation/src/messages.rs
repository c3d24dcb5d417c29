//! Message templates for the built-in validator.
//!
//! Templates use `%s` placeholders, filled left to right: the field path
//! first, then the rule parameters.

use serde::{Deserialize, Serialize};

/// Templates for length/bound checks of one value kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeMessages {
    pub len: String,
    pub min: String,
    pub max: String,
    pub range: String,
}

/// Message templates, overridable per form. Missing keys keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateMessages {
    pub required: String,
    #[serde(rename = "enum")]
    pub one_of: String,
    pub whitespace: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub string: RangeMessages,
    pub number: RangeMessages,
    pub array: RangeMessages,
}

impl Default for ValidateMessages {
    fn default() -> Self {
        Self {
            required: "%s is required".into(),
            one_of: "%s must be one of %s".into(),
            whitespace: "%s cannot be empty".into(),
            kind: "%s is not a valid %s".into(),
            string: RangeMessages {
                len: "%s must be exactly %s characters".into(),
                min: "%s must be at least %s characters".into(),
                max: "%s cannot be longer than %s characters".into(),
                range: "%s must be between %s and %s characters".into(),
            },
            number: RangeMessages {
                len: "%s must equal %s".into(),
                min: "%s cannot be less than %s".into(),
                max: "%s cannot be greater than %s".into(),
                range: "%s must be between %s and %s".into(),
            },
            array: RangeMessages {
                len: "%s must be exactly %s in length".into(),
                min: "%s cannot be less than %s in length".into(),
                max: "%s cannot be greater than %s in length".into(),
                range: "%s must be between %s and %s in length".into(),
            },
        }
    }
}

impl Default for RangeMessages {
    fn default() -> Self {
        ValidateMessages::default().string
    }
}

impl ValidateMessages {
    /// Fills `%s` placeholders in `template` with `args`, in order.
    /// Surplus placeholders are left untouched.
    pub fn format(template: &str, args: &[&str]) -> String {
        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template;
        while let Some(pos) = rest.find("%s") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("%s"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}
