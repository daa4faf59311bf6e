//! Path keys for the document store

use std::fmt;
use std::path::{Path, PathBuf};

/// A path spelled with forward slashes.
///
/// Two spellings of the same file compare equal once passed through
/// [`NormalizedPath::canonical`], which makes the type usable as a map key
/// for open documents. Native paths are produced only for I/O.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Platform path for I/O
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Resolve to a canonical identity for this path.
    ///
    /// Existing paths are canonicalized (symlinks resolved, no `\\?\` prefix
    /// on Windows). For a path that does not exist yet the parent directory
    /// is canonicalized instead, so the same file always maps to the same
    /// key before and after it is created.
    pub fn canonical(&self) -> Self {
        let native = self.to_native();
        if let Ok(resolved) = dunce::canonicalize(&native) {
            return Self::new(resolved);
        }
        match (native.parent(), native.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                match dunce::canonicalize(parent) {
                    Ok(resolved) => Self::new(resolved.join(name)),
                    Err(_) => self.clone(),
                }
            }
            _ => self.clone(),
        }
    }

    /// Last component, if any
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Extension of the file name. Dotfiles such as `.gitignore` have none.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}
