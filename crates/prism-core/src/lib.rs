#![forbid(unsafe_code)]

//! Core value model for Prism: the immutable snapshot tree, key paths, and
//! the transactional write surface.
//!
//! A *snapshot* is one immutable version of the full application state,
//! represented as a [`Value`] tree backed by persistent collections from the
//! `im` crate. Every write produces a new root; subtrees not touched by a
//! write are shared between the old and new snapshots and remain
//! identity-stable, which is what allows the store layer to diff a
//! subscriber's declared paths in O(paths) instead of O(state).

pub mod error;
pub mod path;
pub mod transaction;
pub mod value;

pub use error::{Error, Result};
pub use path::{Key, Path};
pub use transaction::Transaction;
pub use value::{Action, Value};
