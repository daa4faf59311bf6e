//! Filesystem primitives for usekit
//!
//! Provides normalized path handling and safe text I/O for the project
//! files usekit edits.

pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use path::NormalizedPath;
