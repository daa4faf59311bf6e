//! Format-specific editable trees
//!
//! Each format family keeps its own lossless representation of the file
//! and exposes it through [`Tree`] as plain `serde_json::Value` nodes. Writes
//! are applied to the lossless representation so that the parts of the file
//! a write does not touch keep their comments, key order and styling.

mod json;
mod toml;
mod yaml;

pub use self::json::JsonTree;
pub use self::toml::TomlTree;
pub use self::yaml::YamlTree;

use crate::error::Result;
use crate::format::Format;
use crate::path::KeyPath;
use serde_json::Value;
use std::path::Path;

/// Editable, format-preserving document tree
pub trait Tree: std::fmt::Debug {
    /// Format identifier
    fn format(&self) -> Format;

    /// The whole document as a plain value, in document order
    fn to_value(&self) -> Value;

    /// Value at `path`, if every segment resolves
    fn get(&self, path: &KeyPath) -> Option<Value>;

    /// Write `value` at `path`, creating intermediate mappings.
    ///
    /// An existing value is reconciled in place: unchanged parts keep their
    /// on-disk representation.
    fn set(&mut self, path: &KeyPath, value: &Value) -> Result<()>;

    /// Remove the value at `path`, returning it if it existed
    fn remove(&mut self, path: &KeyPath) -> Result<Option<Value>>;

    /// Render back to text
    fn render(&self) -> Result<String>;
}

/// Parse `source` into the tree for `format`.
///
/// `path` is only used to label decode errors.
pub fn parse(format: Format, source: &str, path: &Path) -> Result<Box<dyn Tree>> {
    Ok(match format {
        Format::Toml => Box::new(TomlTree::parse(source, path)?),
        Format::Yaml => Box::new(YamlTree::parse(source, path)?),
        Format::Json => Box::new(JsonTree::parse(source, path)?),
    })
}
