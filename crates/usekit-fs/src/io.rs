//! Reading and replacing managed project files
//!
//! A file is replaced through a sibling temp file renamed over it, so a
//! failed write leaves the previous content in place. Writes that would not
//! change the file are skipped and leave its modification time alone.

use crate::{Error, NormalizedPath, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Replace the content of `path`, creating it and its parent directories
/// when missing.
///
/// Returns `false` without touching the file when it already holds
/// `content`.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<bool> {
    let native_path = path.to_native();
    match fs::read(&native_path) {
        Ok(existing) if existing == content.as_bytes() => {
            tracing::debug!(path = %path, "content unchanged, skipping write");
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::io(&native_path, e)),
    }

    if let Some(parent) = native_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let temp_path = temp_sibling(&native_path);
    let result = fill_locked(&temp_path, content.as_bytes(), &native_path)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result?;

    tracing::debug!(path = %path, bytes = content.len(), "wrote file");
    Ok(true)
}

/// `.<name>.<pid>.usekit.tmp` next to `target`, on the same filesystem.
fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.usekit.tmp", std::process::id()))
}

/// Write `content` to `temp_path` under an exclusive advisory lock.
fn fill_locked(temp_path: &Path, content: &[u8], target: &Path) -> Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;
    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(temp_path, e))?;
    file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    file.unlock().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

/// Remove a file. Removing a file that does not exist is not an error.
pub fn remove_file(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => {
            tracing::debug!(path = %path, "removed file");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}
