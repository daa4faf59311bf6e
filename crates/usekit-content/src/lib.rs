//! Structured document store for usekit
//!
//! Loads TOML, YAML and JSON configuration files into editable trees that
//! keep the user's formatting, exposes key-path reads and writes over them,
//! and shares one in-memory copy per file between nested callers.
//!
//! # Example
//!
//! ```no_run
//! use usekit_content::{DocumentStore, KeyPath, OpenMode};
//! use serde_json::json;
//!
//! let store = DocumentStore::new();
//! let doc = store.open("pyproject.toml", OpenMode::CreateIfMissing)?;
//! doc.extend_list(&KeyPath::new(["tool", "ruff", "lint", "select"]), &[json!("E4")])?;
//! doc.close()?;
//! # Ok::<(), usekit_content::Error>(())
//! ```

pub mod document;
pub mod error;
pub mod format;
pub mod path;
pub mod store;
pub mod tree;

pub use document::Document;
pub use error::{Error, Result};
pub use format::Format;
pub use path::{Key, KeyPath};
pub use store::{DocumentGuard, DocumentStore, OpenMode};
