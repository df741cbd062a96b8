#![forbid(unsafe_code)]

//! The immutable snapshot tree.
//!
//! [`Value`] is a persistent, structurally-shared tree of maps, lists, and
//! scalars, plus [`Action`] leaves: callables stored *in* the state tree that
//! the store exposes as its mutation surface.
//!
//! # Design
//!
//! Collections are backed by `im` ([`im::OrdMap`] / [`im::Vector`]), so a
//! `Value` clone is an O(1) handle copy and a path-copying write shares every
//! untouched branch with the previous snapshot.
//!
//! # Invariants
//!
//! 1. A `Value` is never mutated in place; every change produces a new root.
//! 2. Subtrees not on a written path are identity-stable across writes:
//!    [`Value::same`] returns `true` for them.
//! 3. [`Value::same`] is O(1): scalars by value, collections by pointer,
//!    actions by function identity. It never deep-compares.
//!
//! # Example
//!
//! ```
//! use prism_core::{Path, Value};
//!
//! let root = Value::from(serde_json::json!({"user": {"name": "ada"}}));
//! let path = Path::parse("user.name").unwrap();
//! assert_eq!(path.resolve(&root).and_then(Value::as_str), Some("ada"));
//! ```

use std::fmt;
use std::rc::Rc;

use im::{OrdMap, Vector};

use crate::error::Result;
use crate::transaction::Transaction;

// ─── Action ──────────────────────────────────────────────────────────────────

/// A callable stored in the state tree.
///
/// Actions receive a [`Transaction`] over the snapshot they were bound
/// against plus caller-supplied arguments. Cloning an `Action` clones the
/// handle; [`Action::same`] compares function identity.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn(&mut Transaction, &[Value]) -> Result<()>>);

impl Action {
    pub fn new(f: impl Fn(&mut Transaction, &[Value]) -> Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the action against the given transaction.
    pub fn call(&self, txn: &mut Transaction, args: &[Value]) -> Result<()> {
        (self.0)(txn, args)
    }

    /// Whether two handles refer to the same underlying function.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// One node of the immutable state tree.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    /// Lists carry an `Rc` because `im::Vector` stores small vectors inline,
    /// where `Vector::ptr_eq` is not stable across clones; identity comes
    /// from the shared allocation instead.
    List(Rc<Vector<Value>>),
    Map(OrdMap<Rc<str>, Value>),
    Action(Action),
}

impl Value {
    /// Build a map value from `(name, value)` pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<Rc<str>>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value from an iterator of values.
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Value {
        Value::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Wrap a closure as an [`Action`] value.
    pub fn action(f: impl Fn(&mut Transaction, &[Value]) -> Result<()> + 'static) -> Value {
        Value::Action(Action::new(f))
    }

    // ── Accessors ────────────────────────────────────────────────────

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Value::List(l) => Some(l.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&OrdMap<Rc<str>, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Value::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Map field lookup. `None` for non-map values or missing keys.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// List element lookup. `None` for non-list values or out-of-range.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(l) => l.get(index),
            _ => None,
        }
    }

    /// Human-readable kind name, used in error messages and diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Action(_) => "action",
        }
    }

    // ── Comparison ───────────────────────────────────────────────────

    /// O(1) identity comparison: the diffing primitive.
    ///
    /// Scalars compare by value; lists compare by `Rc` identity, maps by
    /// pointer equality of the persistent structure (unchanged branches of a
    /// path-copying write stay pointer-equal); actions compare by function
    /// identity.
    #[must_use]
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Action(a), Value::Action(b)) => a.same(b),
            _ => false,
        }
    }

    // ── JSON interop ─────────────────────────────────────────────────

    /// Convert to a plain JSON value.
    ///
    /// Actions are not representable: map entries holding actions are
    /// dropped, and a bare action becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => (*b).into(),
            Value::Int(i) => (*i).into(),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Value::Action(_)))
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Action(_) => serde_json::Value::Null,
        }
    }
}

/// Deep structural equality. Actions compare by identity.
///
/// This is for tests and no-op write detection; change diffing uses
/// [`Value::same`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || a == b,
            (Value::Action(a), Value::Action(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Action(a) => a.fmt(f),
        }
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Action> for Value {
    fn from(a: Action) -> Self {
        Value::Action(a)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::Str(Rc::from(s)),
            serde_json::Value::Array(items) => {
                Value::List(Rc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Rc::from(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
