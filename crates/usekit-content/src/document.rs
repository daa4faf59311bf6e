//! Editable document with key-path access

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::path::KeyPath;
use crate::tree::{self, Tree};

/// One structured file held in memory.
///
/// Edits that leave the value unchanged do not mark the document dirty, so
/// an unchanged document is never written back.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    tree: Box<dyn Tree>,
    dirty: bool,
}

impl Document {
    /// Parse `source` as `format`. `path` labels errors and the write target.
    pub fn parse(path: impl Into<PathBuf>, format: Format, source: &str) -> Result<Self> {
        let path = path.into();
        let tree = tree::parse(format, source, &path)?;
        Ok(Self {
            path,
            tree,
            dirty: false,
        })
    }

    /// An empty document for a file that does not exist yet
    pub fn empty(path: impl Into<PathBuf>, format: Format) -> Result<Self> {
        Self::parse(path, format, "")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.tree.format()
    }

    /// Whether the in-memory copy differs from what was loaded
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The whole document as a plain value
    pub fn root(&self) -> Value {
        self.tree.to_value()
    }

    pub fn get(&self, path: &KeyPath) -> Result<Value> {
        self.tree.get(path).ok_or_else(|| self.missing(path))
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.tree.get(path).is_some()
    }

    /// Write `value` at `path`, creating intermediate mappings.
    ///
    /// Fails with `ValueAlreadySet` when something is already there and
    /// `exists_ok` is false.
    pub fn set(&mut self, path: &KeyPath, value: Value, exists_ok: bool) -> Result<()> {
        match self.tree.get(path) {
            Some(_) if !exists_ok => Err(Error::ValueAlreadySet {
                path: self.path.clone(),
                key: path.to_string(),
            }),
            Some(existing) if existing == value => Ok(()),
            _ => {
                self.tree.set(path, &value)?;
                self.dirty = true;
                Ok(())
            }
        }
    }

    /// Remove the value at `path` and return it.
    ///
    /// Parents emptied by the removal are kept.
    pub fn delete(&mut self, path: &KeyPath) -> Result<Value> {
        match self.tree.remove(path)? {
            Some(removed) => {
                self.dirty = true;
                Ok(removed)
            }
            None => Err(self.missing(path)),
        }
    }

    /// Replace the whole document value
    pub fn set_root(&mut self, value: Value) -> Result<()> {
        if self.tree.to_value() == value {
            return Ok(());
        }
        self.tree.set(&KeyPath::root(), &value)?;
        self.dirty = true;
        Ok(())
    }

    /// Append each of `values` not already in the list at `path`.
    ///
    /// The list is created when absent. Returns whether anything was added.
    pub fn extend_list(&mut self, path: &KeyPath, values: &[Value]) -> Result<bool> {
        let mut items = match self.tree.get(path) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.not_a_list(path)),
            None => Vec::new(),
        };
        let before = items.len();
        for value in values {
            if !items.contains(value) {
                items.push(value.clone());
            }
        }
        if items.len() == before && self.tree.get(path).is_some() {
            return Ok(false);
        }
        let changed = items.len() != before;
        self.set(path, Value::Array(items), true)?;
        Ok(changed)
    }

    /// Remove every occurrence of `values` from the list at `path`.
    ///
    /// A missing list or absent values are a no-op; an emptied list is
    /// kept. Returns whether anything was removed.
    pub fn remove_from_list(&mut self, path: &KeyPath, values: &[Value]) -> Result<bool> {
        let items = match self.tree.get(path) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.not_a_list(path)),
            None => return Ok(false),
        };
        let before = items.len();
        let kept: Vec<Value> = items.into_iter().filter(|v| !values.contains(v)).collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.set(path, Value::Array(kept), true)?;
        Ok(true)
    }

    pub fn list_contains(&self, path: &KeyPath, value: &Value) -> bool {
        matches!(self.tree.get(path), Some(Value::Array(items)) if items.contains(value))
    }

    /// Render the document to text
    pub fn render(&self) -> Result<String> {
        self.tree.render()
    }

    fn missing(&self, path: &KeyPath) -> Error {
        Error::ValueMissing {
            path: self.path.clone(),
            key: path.to_string(),
        }
    }

    fn not_a_list(&self, path: &KeyPath) -> Error {
        Error::unsupported(self.format(), path.to_string(), "the value is not a list")
    }
}
