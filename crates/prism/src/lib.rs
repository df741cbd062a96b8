#![forbid(unsafe_code)]

//! Prism public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use prism_core as core;
pub use prism_store as store;

pub mod prelude {
    pub use prism_core::{Action, Error, Key, Path, Transaction, Value};
    pub use prism_store::{
        Component, Connected, Connector, Props, Scheme, SchemeMap, Store, StoreError,
        SubscriptionId,
    };
}
