#![forbid(unsafe_code)]

//! Component properties.
//!
//! [`Props`] is an ordered name → [`Value`] map. Incoming component
//! properties and store-derived data slices share this shape, because a
//! slice is merged over the incoming properties at render time.

use std::rc::Rc;

use im::OrdMap;
use prism_core::Value;

/// An ordered, cheaply-cloneable property map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    entries: OrdMap<Rc<str>, Value>,
}

impl Props {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.entries.iter()
    }

    /// Union of `self` and `overlay`; overlay keys win on collision.
    #[must_use]
    pub fn merged(&self, overlay: &Props) -> Props {
        let mut entries = self.entries.clone();
        for (name, value) in &overlay.entries {
            entries.insert(name.clone(), value.clone());
        }
        Props { entries }
    }

    /// One-level equality: same key set, and each value identical per
    /// [`Value::same`]. Never recurses into collections.
    #[must_use]
    pub fn shallow_eq(&self, other: &Props) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| {
                    other
                        .entries
                        .get(name.as_ref())
                        .is_some_and(|o| value.same(o))
                })
    }
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Props {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
