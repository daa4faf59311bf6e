//! Error types for usekit-core

use std::path::PathBuf;

/// Result type for usekit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while applying changes to a project
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project directory does not exist
    #[error("Project directory not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// An option value could not be understood
    #[error("Invalid value '{value}' for option '{name}'")]
    InvalidOption { name: &'static str, value: String },

    /// The dependency backend could not run a command
    #[error("Command `{command}` failed: {stderr}")]
    BackendFailed { command: String, stderr: String },

    /// Document store error from usekit-content
    #[error(transparent)]
    Content(#[from] usekit_content::Error),

    /// Model error from usekit-model
    #[error(transparent)]
    Model(#[from] usekit_model::Error),

    /// Filesystem error from usekit-fs
    #[error(transparent)]
    Fs(#[from] usekit_fs::Error),
}
