//! Error type shared by the tree, the edit operations and the loaders.
//!
//! Expected classification branches (a merge refused at an unbreakable
//! boundary, a no-op at the start of the document) are not errors; they are
//! reported through `editor::Outcome`. Only lookups that fail and host
//! contract violations end up here.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::document::NodeId;

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Edit errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A navigation primitive could not locate a required ancestor.
    NotFound { node: NodeId, what: &'static str },

    /// The selection references a node that is not part of the tree, or an
    /// offset past the end of its node.
    InvalidSelection(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Fixture notation
    // ─────────────────────────────────────────────────────────────────────────
    Notation { message: String, position: usize },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────
    ConfigRead { path: PathBuf, source: io::Error },

    ConfigParse { path: PathBuf, source: toml::de::Error },
}

impl Error {
    pub(crate) fn not_found(node: NodeId, what: &'static str) -> Self {
        Error::NotFound { node, what }
    }

    pub(crate) fn notation(message: impl Into<String>, position: usize) -> Self {
        Error::Notation {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { node, what } => {
                write!(f, "no {} found from node {}", what, node.index())
            }
            Error::InvalidSelection(msg) => write!(f, "invalid selection: {}", msg),
            Error::Notation { message, position } => {
                write!(f, "malformed fixture at byte {}: {}", position, message)
            }
            Error::ConfigRead { path, source } => {
                write!(
                    f,
                    "failed to read configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { path, source } => {
                write!(
                    f,
                    "invalid configuration in '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ConfigRead { source, .. } => Some(source),
            Error::ConfigParse { source, .. } => Some(source),
            Error::NotFound { .. } | Error::InvalidSelection(_) | Error::Notation { .. } => None,
        }
    }
}
