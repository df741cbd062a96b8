#![forbid(unsafe_code)]

//! Schemes: a component's declared data dependencies.
//!
//! A [`SchemeMap`] maps output field names to store [`Path`]s. A [`Scheme`]
//! is either a static map, fixed for the component's lifetime, or a dynamic
//! function from the component's current [`Props`] to a map, re-evaluated
//! whenever the properties change.
//!
//! Diffing ([`SchemeMap::changed_between`]) resolves each bound path against
//! two snapshots and compares the results with [`Value::same`] — identity,
//! not deep equality. This is the performance-critical contract: cost is
//! O(number of bindings), never O(store size).
//!
//! The output key `*` means "flatten": when its path resolves to a map, that
//! map's fields are merged directly into the extracted subset. When it
//! resolves to anything else the binding contributes nothing (best-effort
//! degrade, logged at warn level).

use std::rc::Rc;

use prism_core::{Path, Value};

use crate::error::Result;
use crate::props::Props;

// ─── SchemeMap ───────────────────────────────────────────────────────────────

/// An output-field binding: a named field, or `*` (flatten into the subset).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemeKey {
    Field(Rc<str>),
    Flatten,
}

/// An ordered set of `output field → path` bindings.
#[derive(Clone, Debug, Default)]
pub struct SchemeMap {
    entries: Vec<(SchemeKey, Path)>,
}

impl SchemeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default scheme `{*: *}`: the entire snapshot, flattened.
    #[must_use]
    pub fn whole_store() -> Self {
        Self::new().bind_path("*", Path::Root)
    }

    /// Bind `name` to a path string. The name `*` flattens; a malformed path
    /// fails with `InvalidPath`.
    pub fn bind(self, name: &str, path: &str) -> Result<Self> {
        let path = Path::parse(path)?;
        Ok(self.bind_path(name, path))
    }

    /// Bind `name` to an already-parsed path.
    #[must_use]
    pub fn bind_path(mut self, name: &str, path: Path) -> Self {
        let key = if name == "*" {
            SchemeKey::Flatten
        } else {
            SchemeKey::Field(Rc::from(name))
        };
        self.entries.push((key, path));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(SchemeKey, Path)> {
        self.entries.iter()
    }

    /// Whether any bound path resolves to a different value between two
    /// snapshots. Presence changes count as changes.
    #[must_use]
    pub fn changed_between(&self, previous: &Value, current: &Value) -> bool {
        self.entries.iter().any(|(_, path)| {
            match (path.resolve(previous), path.resolve(current)) {
                (Some(a), Some(b)) => !a.same(b),
                (None, None) => false,
                _ => true,
            }
        })
    }

    /// Extract the subset this scheme describes from a snapshot.
    ///
    /// Missing paths contribute nothing. Later bindings win on key
    /// collision, matching merge order.
    #[must_use]
    pub fn extract(&self, root: &Value) -> Props {
        let mut out = Props::new();
        for (key, path) in &self.entries {
            let Some(value) = path.resolve(root) else {
                continue;
            };
            match key {
                SchemeKey::Field(name) => out.insert(name.clone(), value.clone()),
                SchemeKey::Flatten => match value {
                    Value::Map(map) => {
                        for (name, field) in map {
                            out.insert(name.clone(), field.clone());
                        }
                    }
                    other => {
                        tracing::warn!(
                            message = "scheme.flatten_non_map",
                            path = %path,
                            found = other.type_name()
                        );
                    }
                },
            }
        }
        out
    }
}

// ─── Scheme ──────────────────────────────────────────────────────────────────

/// A static or props-derived scheme.
#[derive(Clone)]
pub enum Scheme {
    Static(SchemeMap),
    Dynamic(Rc<dyn Fn(&Props) -> SchemeMap>),
}

impl Scheme {
    /// A scheme recomputed from the owning component's properties.
    pub fn dynamic(f: impl Fn(&Props) -> SchemeMap + 'static) -> Self {
        Scheme::Dynamic(Rc::new(f))
    }

    /// The default scheme `{*: *}`.
    #[must_use]
    pub fn whole_store() -> Self {
        Scheme::Static(SchemeMap::whole_store())
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Scheme::Dynamic(_))
    }

    /// Resolve to a concrete map: static schemes return their map, dynamic
    /// schemes are invoked with the given properties.
    #[must_use]
    pub fn resolve(&self, props: &Props) -> SchemeMap {
        match self {
            Scheme::Static(map) => map.clone(),
            Scheme::Dynamic(f) => f(props),
        }
    }
}

impl From<SchemeMap> for Scheme {
    fn from(map: SchemeMap) -> Self {
        Scheme::Static(map)
    }
}

impl std::fmt::Debug for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Scheme::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::Transaction;
    use serde_json::json;

    fn snapshot() -> Value {
        Value::from(json!({"count": 3, "user": {"name": "ada"}, "leaf": 7}))
    }

    #[test]
    fn extract_named_bindings() {
        let scheme = SchemeMap::new()
            .bind("n", "count")
            .unwrap()
            .bind("who", "user.name")
            .unwrap();
        let subset = scheme.extract(&snapshot());
        assert_eq!(subset.get("n"), Some(&Value::Int(3)));
        assert_eq!(subset.get("who"), Some(&Value::from("ada")));
    }

    #[test]
    fn extract_omits_missing_paths() {
        let scheme = SchemeMap::new().bind("gone", "user.age").unwrap();
        assert!(scheme.extract(&snapshot()).is_empty());
    }

    #[test]
    fn whole_store_flattens_a_map_root() {
        let subset = SchemeMap::whole_store().extract(&snapshot());
        assert_eq!(subset.get("count"), Some(&Value::Int(3)));
        assert_eq!(subset.get("leaf"), Some(&Value::Int(7)));
        assert_eq!(subset.len(), 3);
    }

    #[test]
    fn flatten_of_a_submap_merges_its_fields() {
        let scheme = SchemeMap::new().bind("*", "user").unwrap();
        let subset = scheme.extract(&snapshot());
        assert_eq!(subset.get("name"), Some(&Value::from("ada")));
        assert_eq!(subset.len(), 1);
    }

    #[test]
    fn flatten_of_a_non_map_contributes_nothing() {
        let scheme = SchemeMap::new()
            .bind("*", "leaf")
            .unwrap()
            .bind("n", "count")
            .unwrap();
        let subset = scheme.extract(&snapshot());
        assert_eq!(subset.get("n"), Some(&Value::Int(3)));
        assert_eq!(subset.len(), 1);
    }

    #[test]
    fn later_bindings_win_on_collision() {
        let scheme = SchemeMap::new()
            .bind("n", "count")
            .unwrap()
            .bind("n", "leaf")
            .unwrap();
        assert_eq!(scheme.extract(&snapshot()).get("n"), Some(&Value::Int(7)));
    }

    #[test]
    fn bind_rejects_malformed_paths() {
        assert!(SchemeMap::new().bind("n", "a..b").is_err());
    }

    #[test]
    fn changed_between_sees_only_bound_paths() {
        let before = snapshot();
        let mut txn = Transaction::new(before.clone());
        txn.set("count", 4).unwrap();
        let (after, _) = txn.into_parts();

        let on_count = SchemeMap::new().bind("n", "count").unwrap();
        let on_user = SchemeMap::new().bind("who", "user.name").unwrap();
        assert!(on_count.changed_between(&before, &after));
        assert!(!on_user.changed_between(&before, &after));
    }

    #[test]
    fn sibling_write_leaves_a_small_list_binding_unchanged() {
        let before = Value::from(json!({"xs": [], "n": 1}));
        let mut txn = Transaction::new(before.clone());
        txn.set("n", 2).unwrap();
        let (after, _) = txn.into_parts();

        let scheme = SchemeMap::new().bind("xs", "xs").unwrap();
        assert!(!scheme.changed_between(&before, &after));
    }

    #[test]
    fn presence_change_counts_as_change() {
        let before = snapshot();
        let mut txn = Transaction::new(before.clone());
        txn.remove("leaf").unwrap();
        let (after, _) = txn.into_parts();

        let scheme = SchemeMap::new().bind("x", "leaf").unwrap();
        assert!(scheme.changed_between(&before, &after));
        assert!(!scheme.changed_between(&before, &before));
    }

    #[test]
    fn wildcard_path_tracks_any_root_change() {
        let before = snapshot();
        let mut txn = Transaction::new(before.clone());
        txn.set("count", 4).unwrap();
        let (after, _) = txn.into_parts();
        assert!(SchemeMap::whole_store().changed_between(&before, &after));
    }

    #[test]
    fn dynamic_scheme_resolves_against_props() {
        let scheme = Scheme::dynamic(|props| {
            let which = props
                .get("which")
                .and_then(Value::as_str)
                .unwrap_or("count")
                .to_string();
            SchemeMap::new().bind_path("val", Path::parse(&which).expect("valid path"))
        });
        assert!(scheme.is_dynamic());

        let subset = scheme
            .resolve(&Props::new().with("which", "user.name"))
            .extract(&snapshot());
        assert_eq!(subset.get("val"), Some(&Value::from("ada")));

        let subset = scheme.resolve(&Props::new()).extract(&snapshot());
        assert_eq!(subset.get("val"), Some(&Value::Int(3)));
    }
}
