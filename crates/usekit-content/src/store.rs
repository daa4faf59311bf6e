//! Re-entrant document store
//!
//! Every file is loaded at most once while any caller holds it open. Nested
//! opens of the same path share the in-memory document; the outermost
//! release writes it back if, and only if, it was changed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use usekit_fs::NormalizedPath;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::path::KeyPath;

/// What to do when the file to open does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail with [`Error::NotFound`]
    Existing,
    /// Start from an empty document, only written if it becomes dirty
    CreateIfMissing,
}

#[derive(Debug)]
struct OpenDocument {
    document: Document,
    depth: usize,
}

/// Cache of open documents, keyed by canonical path.
///
/// Single-threaded: handles borrow the store and are released in reverse
/// order of acquisition.
#[derive(Debug, Default)]
pub struct DocumentStore {
    open: RefCell<HashMap<NormalizedPath, OpenDocument>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, sharing the in-memory copy with any handle already open.
    pub fn open(&self, path: impl AsRef<Path>, mode: OpenMode) -> Result<DocumentGuard<'_>> {
        let key = NormalizedPath::new(path.as_ref()).canonical();
        let mut open = self.open.borrow_mut();

        if let Some(entry) = open.get_mut(&key) {
            entry.depth += 1;
            tracing::trace!(path = %key, depth = entry.depth, "reusing open document");
            return Ok(DocumentGuard::new(self, key));
        }

        let document = load(&key, mode)?;
        tracing::debug!(path = %key, format = %document.format(), "opened document");
        open.insert(key.clone(), OpenDocument { document, depth: 1 });
        Ok(DocumentGuard::new(self, key))
    }

    /// Whether a handle for `path` is currently held
    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        let key = NormalizedPath::new(path.as_ref()).canonical();
        self.open.borrow().contains_key(&key)
    }

    /// Write a dirty open document now. Returns whether anything was written.
    pub fn flush(&self, path: impl AsRef<Path>) -> Result<bool> {
        let key = NormalizedPath::new(path.as_ref()).canonical();
        let mut open = self.open.borrow_mut();
        match open.get_mut(&key) {
            Some(entry) if entry.document.is_dirty() => {
                write_back(&key, &entry.document)?;
                entry.document.mark_clean();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Re-read a clean open document from disk after an external edit.
    ///
    /// Documents that are not open need no invalidation. A dirty document
    /// cannot be reloaded without losing its changes.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<()> {
        let key = NormalizedPath::new(path.as_ref()).canonical();
        let mut open = self.open.borrow_mut();
        let Some(entry) = open.get_mut(&key) else {
            return Ok(());
        };
        if entry.document.is_dirty() {
            return Err(Error::UnexpectedIo {
                path: key.to_native(),
                message: "cannot reload a document with unsaved changes".to_string(),
            });
        }
        entry.document = load(&key, OpenMode::CreateIfMissing)?;
        tracing::debug!(path = %key, "reloaded document");
        Ok(())
    }

    /// Delete a file. Fails while a handle for it is held.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        let key = NormalizedPath::new(path.as_ref()).canonical();
        if self.open.borrow().contains_key(&key) {
            return Err(Error::UnexpectedOpen {
                path: key.to_native(),
                message: "cannot remove a file that is open".to_string(),
            });
        }
        Ok(usekit_fs::io::remove_file(&key)?)
    }

    fn with_document<R>(
        &self,
        key: &NormalizedPath,
        f: impl FnOnce(&mut Document) -> Result<R>,
    ) -> Result<R> {
        let mut open = self.open.borrow_mut();
        let entry = open.get_mut(key).ok_or_else(|| Error::UnexpectedOpen {
            path: key.to_native(),
            message: "document is not open".to_string(),
        })?;
        f(&mut entry.document)
    }

    fn release(&self, key: &NormalizedPath) -> Result<()> {
        let finished = {
            let mut open = self.open.borrow_mut();
            let entry = open.get_mut(key).ok_or_else(|| Error::UnexpectedOpen {
                path: key.to_native(),
                message: "released more often than opened".to_string(),
            })?;
            entry.depth -= 1;
            if entry.depth > 0 {
                return Ok(());
            }
            open.remove(key)
        };

        match finished {
            Some(entry) if entry.document.is_dirty() => write_back(key, &entry.document),
            _ => {
                tracing::trace!(path = %key, "closed clean document");
                Ok(())
            }
        }
    }
}

fn load(key: &NormalizedPath, mode: OpenMode) -> Result<Document> {
    let format = key
        .extension()
        .and_then(Format::from_extension)
        .ok_or_else(|| Error::UnsupportedFile {
            path: key.to_native(),
        })?;

    match usekit_fs::io::read_text(key) {
        Ok(text) => Document::parse(key.to_native(), format, &text),
        Err(e) if e.is_not_found() => match mode {
            OpenMode::Existing => Err(Error::NotFound {
                path: key.to_native(),
            }),
            OpenMode::CreateIfMissing => Document::empty(key.to_native(), format),
        },
        Err(e) => Err(e.into()),
    }
}

fn write_back(key: &NormalizedPath, document: &Document) -> Result<()> {
    let text = document.render()?;
    let written = usekit_fs::io::write_text(key, &text)?;
    tracing::debug!(path = %key, written, "wrote back document");
    Ok(())
}

/// Scoped handle on an open document.
///
/// Release with [`DocumentGuard::close`] to observe write-back errors;
/// dropping the guard releases it as well and logs them.
#[derive(Debug)]
pub struct DocumentGuard<'s> {
    store: &'s DocumentStore,
    key: NormalizedPath,
    released: bool,
}

impl<'s> DocumentGuard<'s> {
    fn new(store: &'s DocumentStore, key: NormalizedPath) -> Self {
        Self {
            store,
            key,
            released: false,
        }
    }

    /// Canonical path of the document
    pub fn path(&self) -> PathBuf {
        self.key.to_native()
    }

    pub fn format(&self) -> Result<Format> {
        self.store.with_document(&self.key, |doc| Ok(doc.format()))
    }

    pub fn is_dirty(&self) -> Result<bool> {
        self.store.with_document(&self.key, |doc| Ok(doc.is_dirty()))
    }

    pub fn root(&self) -> Result<Value> {
        self.store.with_document(&self.key, |doc| Ok(doc.root()))
    }

    pub fn get(&self, path: &KeyPath) -> Result<Value> {
        self.store.with_document(&self.key, |doc| doc.get(path))
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.store
            .with_document(&self.key, |doc| Ok(doc.contains(path)))
            .unwrap_or(false)
    }

    pub fn set(&self, path: &KeyPath, value: Value, exists_ok: bool) -> Result<()> {
        self.store
            .with_document(&self.key, |doc| doc.set(path, value, exists_ok))
    }

    pub fn delete(&self, path: &KeyPath) -> Result<Value> {
        self.store.with_document(&self.key, |doc| doc.delete(path))
    }

    pub fn set_root(&self, value: Value) -> Result<()> {
        self.store.with_document(&self.key, |doc| doc.set_root(value))
    }

    pub fn extend_list(&self, path: &KeyPath, values: &[Value]) -> Result<bool> {
        self.store
            .with_document(&self.key, |doc| doc.extend_list(path, values))
    }

    pub fn remove_from_list(&self, path: &KeyPath, values: &[Value]) -> Result<bool> {
        self.store
            .with_document(&self.key, |doc| doc.remove_from_list(path, values))
    }

    pub fn list_contains(&self, path: &KeyPath, value: &Value) -> bool {
        self.store
            .with_document(&self.key, |doc| Ok(doc.list_contains(path, value)))
            .unwrap_or(false)
    }

    /// Release the handle, writing the document back if this was the
    /// outermost handle and the document changed.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.store.release(&self.key)
    }
}

impl Drop for DocumentGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.store.release(&self.key) {
            tracing::error!(path = %self.key, error = %e, "failed to release document");
        }
    }
}
