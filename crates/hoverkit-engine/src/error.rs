use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the hoverkit engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A handler callback failed.
    #[error("handler for {package} failed: {message}")]
    Handler {
        /// Package the handler serves.
        package: String,
        /// Failure detail.
        message: String,
    },

    /// Errors originating from the overlay layer.
    #[error("overlay error: {0}")]
    Overlay(#[from] hoverkit_overlay::Error),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] config::Error),

    /// A list-container pattern failed to compile.
    #[error("scan pattern error: {0}")]
    Scan(#[from] hoverkit_scan::Error),

    /// The service task is gone.
    #[error("service channel closed")]
    ChannelClosed,
}

impl Error {
    /// Shorthand for a handler failure.
    pub fn handler(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            package: package.into(),
            message: message.into(),
        }
    }
}
