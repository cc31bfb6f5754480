//! Errors raised while normalizing a document.

use std::fmt;

/// Which per-document entry table an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Card,
    Atom,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Card => f.write_str("card"),
            EntryKind::Atom => f.write_str("atom"),
        }
    }
}

/// Error during document normalization.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unexpected document version: \"{0}\"")]
    UnexpectedVersion(String),
    #[error("unknown section kind: {0}")]
    UnknownSectionKind(i64),
    #[error("unknown marker kind: {0}")]
    UnknownMarkerKind(i64),
    #[error("{kind} index {index} out of bounds ({len} entries)")]
    IndexOutOfBounds {
        kind: EntryKind,
        index: usize,
        len: usize,
    },
    #[error("malformed document at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl DocumentError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        DocumentError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
