#![forbid(unsafe_code)]

//! Transactional writes over a base snapshot.
//!
//! A [`Transaction`] is the mutation surface handed to actions: a value-level
//! proxy over one base snapshot that accumulates path-copying writes. Nothing
//! is visible to readers until the store applies the finished transaction in
//! a single install step, so there is no partial-write visibility.
//!
//! # Invariants
//!
//! 1. Writes are path-copying: only the nodes along a written path are
//!    rebuilt; every untouched branch is shared with the base snapshot.
//! 2. Writing a value deep-equal to the one already present is a no-op: it
//!    does not rebuild the path and does not mark the transaction changed.
//! 3. Removing a missing path is a no-op.
//!
//! # Example
//!
//! ```
//! use prism_core::{Transaction, Value};
//!
//! let base = Value::from(serde_json::json!({"count": 0}));
//! let mut txn = Transaction::new(base);
//! txn.update("count", |c| {
//!     Value::Int(c.and_then(Value::as_int).unwrap_or(0) + 1)
//! }).unwrap();
//! let (root, changed) = txn.into_parts();
//! assert!(changed);
//! assert_eq!(root.get("count"), Some(&Value::Int(1)));
//! ```

use std::rc::Rc;

use im::{OrdMap, Vector};

use crate::error::{Error, Result};
use crate::path::{Key, Path};
use crate::value::Value;

/// An in-flight set of writes against one base snapshot.
#[derive(Debug)]
pub struct Transaction {
    root: Value,
    changed: bool,
}

impl Transaction {
    #[must_use]
    pub fn new(base: Value) -> Self {
        Self {
            root: base,
            changed: false,
        }
    }

    /// The working snapshot, including writes made so far.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Whether any write has taken effect.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Read a path from the working snapshot.
    ///
    /// Errors only on a malformed path string; a missing path is `Ok(None)`.
    pub fn get(&self, path: &str) -> Result<Option<&Value>> {
        Ok(Path::parse(path)?.resolve(&self.root))
    }

    /// Write a value at a path, creating missing intermediate maps.
    ///
    /// The wildcard path `*` replaces the whole snapshot. Writing through a
    /// scalar or a list-with-field-key is [`Error::Traverse`]; a list index
    /// equal to the length appends, anything past that is
    /// [`Error::IndexOutOfBounds`].
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let parsed = Path::parse(path)?;
        self.set_parsed(&parsed, path, value.into())
    }

    /// Write the result of `f` applied to the current value at `path`.
    pub fn update(
        &mut self,
        path: &str,
        f: impl FnOnce(Option<&Value>) -> Value,
    ) -> Result<()> {
        let parsed = Path::parse(path)?;
        let next = f(parsed.resolve(&self.root));
        self.set_parsed(&parsed, path, next)
    }

    /// Remove the value at a path. Missing paths are a no-op (`Ok(None)`).
    pub fn remove(&mut self, path: &str) -> Result<Option<Value>> {
        let parsed = Path::parse(path)?;
        let Path::Keys(keys) = &parsed else {
            return Err(Error::invalid_path(path, "cannot remove the store root"));
        };
        match remove_at(&self.root, keys) {
            Some((new_root, removed)) => {
                self.root = new_root;
                self.changed = true;
                Ok(Some(removed))
            }
            None => Ok(None),
        }
    }

    /// Finish the transaction: the resulting snapshot and whether anything
    /// actually changed.
    #[must_use]
    pub fn into_parts(self) -> (Value, bool) {
        (self.root, self.changed)
    }

    fn set_parsed(&mut self, parsed: &Path, raw: &str, value: Value) -> Result<()> {
        match parsed {
            Path::Root => {
                if self.root == value {
                    return Ok(());
                }
                self.root = value;
            }
            Path::Keys(keys) => {
                if parsed.resolve(&self.root).is_some_and(|cur| *cur == value) {
                    return Ok(());
                }
                self.root = write_at(&self.root, keys, raw, value)?;
            }
        }
        self.changed = true;
        Ok(())
    }
}

/// Rebuild the nodes along `keys`, placing `leaf` at the end. Untouched
/// branches are shared with `node`.
fn write_at(node: &Value, keys: &[Key], full_path: &str, leaf: Value) -> Result<Value> {
    let Some((key, rest)) = keys.split_first() else {
        return Ok(leaf);
    };
    match key {
        Key::Field(name) => {
            let map = match node {
                Value::Map(map) => map.clone(),
                Value::Null => OrdMap::new(),
                other => {
                    return Err(Error::Traverse {
                        path: full_path.to_string(),
                        found: other.type_name(),
                    });
                }
            };
            let child = map.get(name.as_ref()).cloned().unwrap_or(Value::Null);
            let new_child = write_at(&child, rest, full_path, leaf)?;
            let mut map = map;
            map.insert(name.clone(), new_child);
            Ok(Value::Map(map))
        }
        Key::Index(index) => {
            let list = match node {
                Value::List(list) => (**list).clone(),
                Value::Null => Vector::new(),
                other => {
                    return Err(Error::Traverse {
                        path: full_path.to_string(),
                        found: other.type_name(),
                    });
                }
            };
            if *index > list.len() {
                return Err(Error::IndexOutOfBounds {
                    path: full_path.to_string(),
                    index: *index,
                    len: list.len(),
                });
            }
            let child = list.get(*index).cloned().unwrap_or(Value::Null);
            let new_child = write_at(&child, rest, full_path, leaf)?;
            let mut list = list;
            if *index == list.len() {
                list.push_back(new_child);
            } else {
                list.set(*index, new_child);
            }
            Ok(Value::List(Rc::new(list)))
        }
    }
}

/// Remove the value at `keys`. `None` when the path does not exist; the
/// removal of a missing path must stay a no-op.
fn remove_at(node: &Value, keys: &[Key]) -> Option<(Value, Value)> {
    let (key, rest) = keys.split_first()?;
    match (key, node) {
        (Key::Field(name), Value::Map(map)) => {
            if rest.is_empty() {
                let mut map = map.clone();
                let removed = map.remove(name.as_ref())?;
                Some((Value::Map(map), removed))
            } else {
                let (new_child, removed) = remove_at(map.get(name.as_ref())?, rest)?;
                let mut map = map.clone();
                map.insert(name.clone(), new_child);
                Some((Value::Map(map), removed))
            }
        }
        (Key::Index(index), Value::List(list)) => {
            if *index >= list.len() {
                return None;
            }
            if rest.is_empty() {
                let mut list = (**list).clone();
                let removed = list.remove(*index);
                Some((Value::List(Rc::new(list)), removed))
            } else {
                let (new_child, removed) = remove_at(list.get(*index)?, rest)?;
                let mut list = (**list).clone();
                list.set(*index, new_child);
                Some((Value::List(Rc::new(list)), removed))
            }
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
