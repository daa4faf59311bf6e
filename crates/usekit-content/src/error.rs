//! Error types for usekit-content

use crate::format::Format;
use std::path::PathBuf;

/// Result type for usekit-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or editing a structured document.
///
/// One variant per failure kind; the format family travels as a tag rather
/// than as a separate error type per format.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file that was required to exist is absent
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// A file exists but is not valid for its format family
    #[error("Failed to decode {format} document {path}: {message}")]
    Decode {
        format: Format,
        path: PathBuf,
        message: String,
    },

    /// A key path does not resolve
    #[error("No value at '{key}' in {path}")]
    ValueMissing { path: PathBuf, key: String },

    /// A point write hit an existing value without `exists_ok`
    #[error("A value is already set at '{key}' in {path}")]
    ValueAlreadySet { path: PathBuf, key: String },

    /// A value cannot be represented at the target location
    #[error("Cannot write '{key}' in {format} document: {reason}")]
    Unsupported {
        format: Format,
        key: String,
        reason: String,
    },

    /// The file has no recognised structured format
    #[error("Unsupported file type: {path}")]
    UnsupportedFile { path: PathBuf },

    /// A handle was used, or a file touched, outside its scoped acquisition
    #[error("Document {path} is not in the expected open state: {message}")]
    UnexpectedOpen { path: PathBuf, message: String },

    /// In-memory state and disk diverged in a way the store cannot reconcile
    #[error("Unexpected I/O state for {path}: {message}")]
    UnexpectedIo { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] usekit_fs::Error),
}

impl Error {
    pub fn decode(format: Format, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            format,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(format: Format, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            format,
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a missing-key condition.
    pub fn is_value_missing(&self) -> bool {
        matches!(self, Self::ValueMissing { .. })
    }
}
