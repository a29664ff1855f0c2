use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the scan crate.
pub type Result<T> = StdResult<T, Error>;

/// Errors produced while preparing a scanner.
#[derive(Debug, Error)]
pub enum Error {
    /// A list-container pattern failed to compile.
    #[error("invalid list pattern {pattern:?}: {message}")]
    Pattern {
        /// The offending pattern source.
        pattern: String,
        /// Compiler message.
        message: String,
    },
}
