#![forbid(unsafe_code)]

//! Error types for the store layer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A dispatched action name not present in the current snapshot's
    /// action table.
    #[error("unknown action: {name}")]
    UnknownAction { name: String },

    /// A path or write error from the value layer.
    #[error(transparent)]
    Core(#[from] prism_core::Error),
}
