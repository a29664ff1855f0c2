//! Error types for configuration loading and validation.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors produced while loading, parsing, or validating a configuration.
pub enum Error {
    #[error("{message}")]
    /// I/O or filesystem read error.
    Read {
        /// Optional path associated with the read error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
    #[error("{message}")]
    /// RON syntax or shape error.
    Parse {
        /// Optional path associated with the parse error.
        path: Option<PathBuf>,
        /// Parser message, including the position when known.
        message: String,
    },
    #[error("{message}")]
    /// Semantically invalid configuration.
    Validation {
        /// Optional path associated with the validation error.
        path: Option<PathBuf>,
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Render a human-friendly error message including the path when available.
    pub fn pretty(&self) -> String {
        match self {
            Self::Read { path, message } => match path {
                Some(p) => format!("Read error at {}: {}", p.display(), message),
                None => format!("Read error: {}", message),
            },
            Self::Parse { path, message } => match path {
                Some(p) => format!("Config parse error at {}\n{}", p.display(), message),
                None => format!("Config parse error\n{}", message),
            },
            Self::Validation { path, message } => match path {
                Some(p) => format!("Config validation error at {}\n{}", p.display(), message),
                None => format!("Config validation error\n{}", message),
            },
        }
    }

    /// Access the optional path attached to this error.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }

    /// Attach `path` to an error that has none.
    pub(crate) fn with_path(mut self, at: &Path) -> Self {
        match &mut self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Validation { path, .. } => {
                if path.is_none() {
                    *path = Some(at.to_path_buf());
                }
            }
        }
        self
    }

    /// Validation error without a path.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_includes_path() {
        let e = Error::invalid("bad regex").with_path(Path::new("/tmp/c.ron"));
        assert_eq!(
            e.pretty(),
            "Config validation error at /tmp/c.ron\nbad regex"
        );
        assert_eq!(e.path(), Some(Path::new("/tmp/c.ron")));
    }

    #[test]
    fn existing_path_is_kept() {
        let e = Error::Read {
            path: Some(PathBuf::from("/a")),
            message: "gone".into(),
        }
        .with_path(Path::new("/b"));
        assert_eq!(e.path(), Some(Path::new("/a")));
        assert_eq!(e.to_string(), "gone");
    }
}
