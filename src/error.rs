//! Error types for txdir.
//!
//! All operations return `Result<T>` which aliases `Result<T, Error>`.
//!
//! A user backing out of a prompt is not an error: cancellable operations
//! return [`Outcome::Canceled`](crate::Outcome) instead.

use crate::fs::LockStatus;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from lock, staging and commit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed on a specific path.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File does not exist in the logical (overlay-resolved) view.
    #[error("File '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// Lock file or autosave snapshot could not be parsed.
    #[error("Malformed file '{}': {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Directory is locked and the lock was not overridden.
    #[error("Directory '{}' is locked by {user} ({status})", dir.display())]
    AlreadyLocked {
        dir: PathBuf,
        status: LockStatus,
        user: String,
    },

    /// Mutating call on a file system opened read-only.
    ///
    /// Indicates a caller bug rather than a runtime condition.
    #[error("File system '{}' is opened read-only", .0.display())]
    ReadOnly(PathBuf),

    /// Lock target is unset, missing, or not a directory.
    #[error("Cannot lock '{}': {reason}", path.display())]
    InvalidLockTarget { path: PathBuf, reason: String },

    /// Lock target changed while a lock is held.
    #[error("Lock on '{}' is still held", .0.display())]
    LockHeld(PathBuf),

    /// ZIP archive could not be read or written.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wraps an I/O error together with the path it happened on.
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn format(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Error::Format {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias for txdir operations.
pub type Result<T> = std::result::Result<T, Error>;
