use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the overlay crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors surfaced by the host window layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A window-layer operation failed.
    #[error("window layer {op} failed: {message}")]
    Layer {
        /// Operation name (`add`, `remove`, `update`).
        op: &'static str,
        /// Host-provided detail.
        message: String,
    },
}

impl Error {
    /// Shorthand for a layer failure.
    pub fn layer(op: &'static str, message: impl Into<String>) -> Self {
        Self::Layer {
            op,
            message: message.into(),
        }
    }
}
