//! Error types for usekit-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] usekit_core::Error),

    #[error(transparent)]
    Tools(#[from] usekit_tools::Error),

    /// The built-in key order tables do not match the models
    #[error("Internal model check failed: {0}")]
    Model(#[from] usekit_model::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
