//! Error types for archive operations.

use arblog_types::ArchiveAddress;
use thiserror::Error;

/// Errors that can occur during archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Nothing exists at the path.
    #[error("no such file or directory: /{path}")]
    NotFound { path: String },

    /// Something already exists at the path.
    #[error("already exists: /{path}")]
    AlreadyExists { path: String },

    #[error("not a directory: /{path}")]
    NotADirectory { path: String },

    #[error("is a directory: /{path}")]
    IsADirectory { path: String },

    /// Non-recursive removal of a directory that still has entries.
    #[error("directory not empty: /{path}")]
    DirectoryNotEmpty { path: String },

    /// The path escapes the archive root or is otherwise malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Data could not be decoded with the requested encoding.
    #[error("invalid encoding for /{path}: {reason}")]
    InvalidEncoding { path: String, reason: String },

    /// This process does not hold the archive's secret key.
    #[error("archive is read-only: {0}")]
    ReadOnly(ArchiveAddress),

    /// No published version of the archive is known.
    #[error("archive unreachable: {0}")]
    Unreachable(ArchiveAddress),

    /// A published commit failed signature verification.
    #[error("bad signature on commit of {0}")]
    BadSignature(ArchiveAddress),

    #[error("store error: {0}")]
    Store(#[from] arblog_store::StoreError),

    #[error("archive lock poisoned")]
    Poisoned,
}

impl ArchiveError {
    /// Returns `true` if the error only says the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience type alias for archive operations.
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
