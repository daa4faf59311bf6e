//! Error types for usekit-tools

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown tool '{name}' (available: {available})")]
    UnknownTool { name: String, available: String },

    #[error("Invalid rule code '{rule}'")]
    InvalidRule { rule: String },

    #[error(transparent)]
    Core(#[from] usekit_core::Error),

    #[error(transparent)]
    Content(#[from] usekit_content::Error),

    #[error(transparent)]
    Model(#[from] usekit_model::Error),
}
