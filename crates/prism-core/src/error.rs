#![forbid(unsafe_code)]

//! Error types for path parsing and transactional writes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A path string that could not be parsed.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A write tried to descend through a value that cannot hold the next key
    /// (e.g. a field key applied to a scalar).
    #[error("cannot descend into {found} at `{path}`")]
    Traverse { path: String, found: &'static str },

    /// A list write outside the writable range `0..=len`.
    #[error("index {index} out of bounds (len {len}) at `{path}`")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

impl Error {
    pub(crate) fn invalid_path(path: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}
