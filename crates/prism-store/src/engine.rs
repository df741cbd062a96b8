#![forbid(unsafe_code)]

//! The store engine: current snapshot, bound actions, change notification.
//!
//! # Architecture
//!
//! [`Store`] is a cheaply-cloneable handle over `Rc<RefCell<..>>` shared
//! state: the current snapshot, the bound-action table, and the subscription
//! registry. Everything is single-threaded and synchronous: an action
//! dispatch runs the action, installs the resulting snapshot, and notifies
//! changed subscribers, all within one call stack.
//!
//! # Invariants
//!
//! 1. Exactly one current snapshot exists at a time; the previous one is
//!    retained only for the duration of a notification pass.
//! 2. A pass evaluates every subscriber it visits against the same
//!    `(previous, current)` snapshot pair, in registration order.
//! 3. A subscriber removed mid-pass is skipped; one added mid-pass is not
//!    visited until the next pass.
//! 4. The action table is rebuilt on every install, so it always reflects
//!    the current snapshot's action entries; each bound action captures the
//!    snapshot it was bound against and runs against that snapshot.
//! 5. No interior borrow is held while a user callback runs; callbacks may
//!    re-enter the store (unsubscribe, or dispatch a nested action).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use prism_core::{Transaction, Value};

use crate::error::{Result, StoreError};
use crate::props::Props;
use crate::registry::{Registry, SubscriptionId};
use crate::scheme::{Scheme, SchemeMap};

/// An action from the snapshot's top-level map, bound to the snapshot that
/// was current when it was last rebound.
#[derive(Clone)]
struct BoundAction {
    func: prism_core::Action,
    base: Value,
}

struct Inner {
    current: Value,
    actions: BTreeMap<Rc<str>, BoundAction>,
    registry: Registry,
}

/// Handle to a reactive store. Cloning shares the same store.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<Inner>>,
}

impl Store {
    /// Create a store from an initial snapshot value.
    ///
    /// Top-level [`Value::Action`] entries whose key does not start with `_`
    /// become dispatchable actions.
    #[must_use]
    pub fn new(initial: Value) -> Self {
        let store = Self {
            inner: Rc::new(RefCell::new(Inner {
                current: Value::Null,
                actions: BTreeMap::new(),
                registry: Registry::new(),
            })),
        };
        store.install(initial);
        store
    }

    /// Create a store from a plain JSON value.
    #[must_use]
    pub fn from_json(initial: serde_json::Value) -> Self {
        Self::new(Value::from(initial))
    }

    /// The current snapshot (O(1) handle clone).
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.borrow().current.clone()
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Dispatch a bound action by name.
    ///
    /// The action runs in a [`Transaction`] over the snapshot it was bound
    /// against; if the transaction changed anything, the result is installed
    /// and subscribers are notified before this returns.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<()> {
        let Some(bound) = self.inner.borrow().actions.get(name).cloned() else {
            return Err(StoreError::UnknownAction {
                name: name.to_string(),
            });
        };
        tracing::trace!(message = "store.call", action = name);
        let mut txn = Transaction::new(bound.base);
        bound.func.call(&mut txn, args)?;
        let (root, changed) = txn.into_parts();
        if changed {
            self.install(root);
        }
        Ok(())
    }

    /// Run a transaction over the current snapshot and install the result.
    ///
    /// This is the external write surface for callers that are not actions
    /// in the state tree.
    pub fn transact(
        &self,
        f: impl FnOnce(&mut Transaction) -> prism_core::Result<()>,
    ) -> Result<()> {
        let mut txn = Transaction::new(self.snapshot());
        f(&mut txn)?;
        let (root, changed) = txn.into_parts();
        if changed {
            self.install(root);
        }
        Ok(())
    }

    /// Names of the currently dispatchable actions, sorted.
    #[must_use]
    pub fn action_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .actions
            .keys()
            .map(ToString::to_string)
            .collect()
    }

    #[must_use]
    pub fn has_action(&self, name: &str) -> bool {
        self.inner.borrow().actions.contains_key(name)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a subscriber. `props` is the owner's property cell, read at
    /// notification time to resolve dynamic schemes.
    pub fn subscribe(
        &self,
        scheme: impl Into<Scheme>,
        props: Rc<RefCell<Props>>,
        callback: impl Fn(Props) + 'static,
    ) -> SubscriptionId {
        self.inner
            .borrow_mut()
            .registry
            .add(scheme.into(), props, Rc::new(callback))
    }

    /// Register a subscriber with no owning component (static props).
    pub fn watch(
        &self,
        scheme: impl Into<Scheme>,
        callback: impl Fn(Props) + 'static,
    ) -> SubscriptionId {
        self.subscribe(scheme, Rc::new(RefCell::new(Props::new())), callback)
    }

    /// Remove a subscription. Idempotent; safe during a notification pass.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let removed = self.inner.borrow_mut().registry.remove(id);
        if removed {
            tracing::trace!(message = "store.unsubscribe", id = id.raw());
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    /// Extract a subset of the current snapshot.
    #[must_use]
    pub fn extract(&self, scheme: &SchemeMap) -> Props {
        scheme.extract(&self.inner.borrow().current)
    }

    // ── Install & notify ─────────────────────────────────────────────

    /// Install `new_root` as the current snapshot, rebind the action table,
    /// and notify every subscriber whose resolved scheme changed between the
    /// previous and new snapshot.
    pub(crate) fn install(&self, new_root: Value) {
        let (previous, current, pass) = {
            let mut inner = self.inner.borrow_mut();
            let previous = std::mem::replace(&mut inner.current, new_root.clone());
            inner.rebind_actions();
            (previous, new_root, inner.registry.pass_entries())
        };

        let total = pass.len();
        let mut notified = 0usize;
        for subscriber in pass {
            // Entries removed by an earlier callback in this pass are
            // skipped; entries added during the pass were not captured.
            if !self.inner.borrow().registry.contains(subscriber.id) {
                continue;
            }
            let resolved = {
                let props = subscriber.props.borrow();
                subscriber.scheme.resolve(&props)
            };
            if resolved.changed_between(&previous, &current) {
                notified += 1;
                (subscriber.callback)(resolved.extract(&current));
            }
        }
        tracing::debug!(message = "store.install", subscribers = total, notified);
    }
}

impl Inner {
    /// Rebuild the action table from the current snapshot's top-level map.
    /// Keys starting with `_` are private and never exposed.
    fn rebind_actions(&mut self) {
        self.actions.clear();
        if let Value::Map(map) = &self.current {
            for (key, value) in map {
                if key.starts_with('_') {
                    continue;
                }
                if let Value::Action(action) = value {
                    self.actions.insert(
                        key.clone(),
                        BoundAction {
                            func: action.clone(),
                            base: self.current.clone(),
                        },
                    );
                }
            }
        }
        tracing::trace!(message = "store.rebind", actions = self.actions.len());
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("snapshot", &inner.current)
            .field("actions", &inner.actions.keys().collect::<Vec<_>>())
            .field("subscribers", &inner.registry.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
