#![forbid(unsafe_code)]

//! Key paths into the snapshot tree.
//!
//! A [`Path`] is either the wildcard `*` (the whole snapshot) or an ordered
//! sequence of [`Key`]s resolved by depth-first descent. Paths are written in
//! dot/bracket form: `"user.name"`, `"todos[0].done"`. A bare all-digit
//! segment is an index, so `"todos.0"` and `"todos[0]"` are the same path.
//!
//! Resolution is total: a missing intermediate key or a key/shape mismatch
//! yields `None`, never an error. Parsing is not: malformed input fails with
//! [`Error::InvalidPath`] rather than silently misbehaving.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::Value;

/// One step of a path: a map field or a list index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Field(Rc<str>),
    Index(usize),
}

/// A location within a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Path {
    /// The wildcard `*`: the entire snapshot.
    Root,
    /// An ordered key descent. Always non-empty.
    Keys(Vec<Key>),
}

impl Path {
    /// Parse a dot/bracket path string.
    ///
    /// `"*"` parses to [`Path::Root`]. Empty paths, empty segments, and
    /// malformed brackets are [`Error::InvalidPath`].
    pub fn parse(input: &str) -> Result<Path> {
        if input == "*" {
            return Ok(Path::Root);
        }
        if input.is_empty() {
            return Err(Error::invalid_path(input, "empty path"));
        }

        let mut keys = Vec::new();
        let mut rest = input;
        loop {
            if let Some(inner) = rest.strip_prefix('[') {
                let Some(close) = inner.find(']') else {
                    return Err(Error::invalid_path(input, "unclosed `[`"));
                };
                let digits = &inner[..close];
                if digits.is_empty() {
                    return Err(Error::invalid_path(input, "empty index brackets"));
                }
                let index = digits
                    .parse()
                    .map_err(|_| Error::invalid_path(input, "index is not a number"))?;
                keys.push(Key::Index(index));
                rest = &inner[close + 1..];
            } else {
                let end = rest.find(['.', '[']).unwrap_or(rest.len());
                let name = &rest[..end];
                if name.is_empty() {
                    return Err(Error::invalid_path(input, "empty segment"));
                }
                if name.bytes().all(|b| b.is_ascii_digit()) {
                    let index = name
                        .parse()
                        .map_err(|_| Error::invalid_path(input, "index is not a number"))?;
                    keys.push(Key::Index(index));
                } else {
                    keys.push(Key::Field(Rc::from(name)));
                }
                rest = &rest[end..];
            }

            if rest.is_empty() {
                break;
            }
            if let Some(after_dot) = rest.strip_prefix('.') {
                if after_dot.is_empty() {
                    return Err(Error::invalid_path(input, "trailing `.`"));
                }
                rest = after_dot;
            } else if !rest.starts_with('[') {
                // Only reachable after a `]`, e.g. "a[0]b".
                return Err(Error::invalid_path(input, "expected `.` or `[` after `]`"));
            }
        }

        Ok(Path::Keys(keys))
    }

    /// Build a path from explicit keys. An empty sequence is the root.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = Key>) -> Path {
        let keys: Vec<Key> = keys.into_iter().collect();
        if keys.is_empty() {
            Path::Root
        } else {
            Path::Keys(keys)
        }
    }

    /// Resolve this path against a snapshot by ordered key descent.
    ///
    /// Returns `None` on any missing key or shape mismatch.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        match self {
            Path::Root => Some(root),
            Path::Keys(keys) => {
                let mut current = root;
                for key in keys {
                    current = match (key, current) {
                        (Key::Field(name), Value::Map(map)) => map.get(name.as_ref())?,
                        (Key::Index(i), Value::List(list)) => list.get(*i)?,
                        _ => return None,
                    };
                }
                Some(current)
            }
        }
    }

    /// Whether this is the wildcard path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Path::Root)
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Path> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Root => f.write_str("*"),
            Path::Keys(keys) => {
                for (i, key) in keys.iter().enumerate() {
                    match key {
                        Key::Field(name) => {
                            if i > 0 {
                                f.write_str(".")?;
                            }
                            f.write_str(name)?;
                        }
                        Key::Index(n) => write!(f, "[{n}]")?,
                    }
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str) -> Key {
        Key::Field(Rc::from(name))
    }

    #[test]
    fn parses_wildcard() {
        assert_eq!(Path::parse("*").unwrap(), Path::Root);
    }

    #[test]
    fn parses_dot_and_bracket_forms() {
        assert_eq!(
            Path::parse("a.b[0].c").unwrap(),
            Path::Keys(vec![field("a"), field("b"), Key::Index(0), field("c")])
        );
        assert_eq!(
            Path::parse("xs[1][2]").unwrap(),
            Path::Keys(vec![field("xs"), Key::Index(1), Key::Index(2)])
        );
    }

    #[test]
    fn bare_digit_segment_is_an_index() {
        assert_eq!(Path::parse("xs.0").unwrap(), Path::parse("xs[0]").unwrap());
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", ".a", "a.", "a..b", "a[", "a[]", "a[x]", "a[0]b"] {
            assert!(
                matches!(Path::parse(bad), Err(Error::InvalidPath { .. })),
                "expected InvalidPath for {bad:?}"
            );
        }
    }

    #[test]
    fn resolves_by_descent() {
        let root = Value::from(json!({"a": {"b": [10, 20]}}));
        let path = Path::parse("a.b[1]").unwrap();
        assert_eq!(path.resolve(&root), Some(&Value::Int(20)));
    }

    #[test]
    fn root_resolves_to_whole_snapshot() {
        let root = Value::from(json!({"a": 1}));
        assert!(Path::Root.resolve(&root).unwrap().same(&root));
    }

    #[test]
    fn missing_intermediate_resolves_to_none() {
        let root = Value::from(json!({"a": {"b": 1}}));
        assert_eq!(Path::parse("a.z.b").unwrap().resolve(&root), None);
        assert_eq!(Path::parse("a.b.c").unwrap().resolve(&root), None);
        assert_eq!(Path::parse("a.b[0]").unwrap().resolve(&root), None);
    }

    #[test]
    fn from_keys_of_nothing_is_root() {
        assert_eq!(Path::from_keys([]), Path::Root);
    }

    #[test]
    fn display_roundtrips() {
        for s in ["*", "a.b[0].c", "xs[1][2]", "a"] {
            let path: Path = s.parse().unwrap();
            assert_eq!(path.to_string(), s);
        }
    }
}
