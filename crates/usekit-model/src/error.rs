//! Error types for usekit-model

/// Result type for usekit-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while projecting or dumping typed models
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value does not have the shape its model requires
    #[error("Invalid {model}: {message}")]
    Structure { model: &'static str, message: String },

    /// A dump produced something other than the kind the caller needs
    #[error("Type error: {message}")]
    Type { message: String },

    /// A canonical order table names a field its model does not have
    #[error("Canonical order for {model} references unknown field '{field}'")]
    Ordering { model: &'static str, field: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
