#![forbid(unsafe_code)]

//! Reactive store engine and component binding for Prism.
//!
//! This crate connects UI components to a shared, immutable store. A
//! component declares, via a [`Scheme`], which store paths it depends on;
//! on every snapshot install the store diffs each subscriber's resolved
//! scheme against the previous snapshot by identity (structural sharing
//! makes this O(scheme), not O(store)) and re-renders only the components
//! whose observed subset actually changed.
//!
//! # Architecture
//!
//! - [`Store`]: holds the current snapshot, the bound-action table, and the
//!   subscription registry behind a cheaply-cloneable `Rc<RefCell<..>>`
//!   handle. Single-threaded and fully synchronous: dispatching an action
//!   mutates, installs, and notifies within one call stack.
//! - [`Scheme`] / [`SchemeMap`]: static or props-derived path bindings,
//!   with identity diffing and subset extraction.
//! - [`Connected`]: wraps a [`Component`] so it subscribes on construction,
//!   re-derives its slice on property changes, unsubscribes on unmount or
//!   drop, and skips renders for shallow-equal property updates.
//!
//! # Invariants
//!
//! 1. A notification pass evaluates every visited subscriber against the
//!    same `(previous, current)` snapshot pair, in registration order.
//! 2. Unsubscribing is idempotent and safe at any time, including during a
//!    pass.
//! 3. Scheme diffing never deep-compares; it relies on unchanged subtrees
//!    staying identity-stable across snapshots.
//!
//! # Example
//!
//! ```
//! use prism_core::Value;
//! use prism_store::{SchemeMap, Store};
//!
//! let store = Store::new(Value::map([
//!     ("count", Value::Int(0)),
//!     ("increment", Value::action(|txn, _| {
//!         txn.update("count", |c| {
//!             Value::Int(c.and_then(Value::as_int).unwrap_or(0) + 1)
//!         })
//!     })),
//! ]));
//!
//! store.call("increment", &[]).unwrap();
//!
//! let subset = store.extract(&SchemeMap::new().bind("n", "count").unwrap());
//! assert_eq!(subset.get("n"), Some(&Value::Int(1)));
//! ```

pub mod connect;
pub mod engine;
pub mod error;
pub mod props;
mod registry;
pub mod scheme;

pub use connect::{Component, Connected, Connector};
pub use engine::Store;
pub use error::{Result, StoreError};
pub use props::Props;
pub use registry::SubscriptionId;
pub use scheme::{Scheme, SchemeKey, SchemeMap};
