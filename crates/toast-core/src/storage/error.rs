//! Errors from the slot database and file writes
//!
//! Each variant carries the path or version involved; the CLI and the
//! terminal editor show `recovery_suggestion` next to the message.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No permission to write '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Out of disk space writing '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Slot database failure
    #[error("Slot database: {0}")]
    Database(#[from] rusqlite::Error),

    /// Slot database was written by a newer version
    #[error("Slot database is at schema {found}, this build reads up to {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    #[error("'{path}' does not exist")]
    NotFound { path: PathBuf },

    /// The temp file was written but could not replace the target
    #[error("Cannot move '{from}' into place at '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Wrap an I/O error for `path`, classified by kind
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_disk_full_error(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => StorageError::WriteError {
                path,
                source: error,
            },
        }
    }

    /// What the writer can do about it, when there is something
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free some disk space, then save again."),
            StorageError::PermissionDenied { .. } | StorageError::CreateDirectory { .. } => {
                Some("Point data_dir or export_dir at a writable directory (toast config set).")
            }
            StorageError::UnsupportedSchema { .. } => {
                Some("Upgrade toast, or point data_dir at a fresh directory.")
            }
            StorageError::Database(_) => {
                Some("Close other toast sessions using the same data_dir.")
            }
            _ => None,
        }
    }
}

/// Check if an I/O error indicates disk full condition
fn is_disk_full_error(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("no space left")
        || msg.contains("disk full")
        || msg.contains("quota exceeded")
        || msg.contains("not enough space")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
