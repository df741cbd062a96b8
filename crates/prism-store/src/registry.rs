#![forbid(unsafe_code)]

//! The subscription registry: who is listening, with which scheme.
//!
//! Entries are kept in registration order. A notification pass works from an
//! id snapshot taken at pass start and re-checks existence before visiting
//! each entry, so unsubscribing mid-pass (a designed scenario: a callback
//! tearing down a sibling component) skips the entry instead of crashing.

use std::cell::RefCell;
use std::rc::Rc;

use crate::props::Props;
use crate::scheme::Scheme;

/// Process-unique token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One registered subscriber: scheme, owner props (read at notify time for
/// dynamic schemes), and the change callback.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub id: SubscriptionId,
    pub scheme: Scheme,
    pub props: Rc<RefCell<Props>>,
    pub callback: Rc<dyn Fn(Props)>,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<Subscriber>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        scheme: Scheme,
        props: Rc<RefCell<Props>>,
        callback: Rc<dyn Fn(Props)>,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push(Subscriber {
            id,
            scheme,
            props,
            callback,
        });
        id
    }

    /// Remove an entry. Idempotent: removing an unknown id returns `false`.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Clone the current entries, in registration order, for one
    /// notification pass.
    pub fn pass_entries(&self) -> Vec<Subscriber> {
        self.entries.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
