//! Path parsing.

use std::borrow::Cow;

/// Largest position a path may address as an array element. Larger digit
/// strings are object keys, so a crafted path cannot force a huge
/// allocation when containers are created.
pub const MAX_INDEX: usize = 65_535;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member access (`.name`, or a bare leading `name`).
    Key(String),
    /// Array element access (`[3]`).
    Index(usize),
}

impl Segment {
    /// Returns the array index this segment denotes, if any.
    ///
    /// Dotted numeric members (`list.2`) count as indices too, so that a
    /// setter creating a missing container builds an array for them.
    /// Positions above [`MAX_INDEX`] never do.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => (*i <= MAX_INDEX).then_some(*i),
            Segment::Key(k) => parse_index(k),
        }
    }

    /// Returns the object key this segment denotes.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(k) => Cow::Borrowed(k),
            Segment::Index(i) => Cow::Owned(i.to_string()),
        }
    }
}

/// `0` or a digit string without a leading zero, up to [`MAX_INDEX`].
fn parse_index(s: &str) -> Option<usize> {
    let canonical = match s.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    };
    if !canonical {
        return None;
    }
    s.parse().ok().filter(|&i| i <= MAX_INDEX)
}

/// Parses a dotted/bracketed path into segments.
///
/// Parsing is lenient: empty members (`a..b`) are skipped, bracket contents
/// that are not a number become keys (quotes stripped), and an unclosed
/// bracket takes the remainder of the string as a key. A bracketed number
/// above [`MAX_INDEX`] is kept as a key.
///
/// ```
/// use formstate_path::{parse_path, Segment};
///
/// assert_eq!(
///     parse_path("user.tags[1].label"),
///     vec![
///         Segment::Key("user".into()),
///         Segment::Key("tags".into()),
///         Segment::Index(1),
///         Segment::Key("label".into()),
///     ]
/// );
/// ```
pub fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '.' => flush_key(&mut current, &mut segments),
            '[' => {
                flush_key(&mut current, &mut segments);
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    segments.push(Segment::Key(format!("[{inner}")));
                    continue;
                }
                let inner = inner.trim_matches(|c| c == '"' || c == '\'');
                match parse_index(inner) {
                    Some(i) => segments.push(Segment::Index(i)),
                    None if inner.is_empty() => {}
                    _ => segments.push(Segment::Key(inner.to_string())),
                }
            }
            c => current.push(c),
        }
    }
    flush_key(&mut current, &mut segments);
    segments
}

fn flush_key(current: &mut String, segments: &mut Vec<Segment>) {
    if !current.is_empty() {
        segments.push(Segment::Key(std::mem::take(current)));
    }
}

/// Appends an object member to a path (`prefix.key`, or bare `key` at the root).
pub fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Appends an array index to a path (`prefix[index]`).
pub fn join_index(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

/// Returns true if `prefix` names a strict ancestor of `path`.
///
/// `a` is part of `a.b` and `a[0]`, but not of `ab` or of `a` itself.
pub fn is_part_of(prefix: &str, path: &str) -> bool {
    path.starts_with(prefix) && matches!(path.as_bytes().get(prefix.len()), Some(b'.' | b'['))
}
