//! Project context threaded through every command

use std::cell::Cell;
use std::path::{Path, PathBuf};

use usekit_content::DocumentStore;

use crate::console::{Console, Style};
use crate::error::{Error, Result};
use crate::options::{OptionOverrides, Options};
use crate::pyproject;

/// A Python project directory and the state a command runs with.
///
/// Owns the document store, so every integration working on the same
/// project shares one in-memory copy of each file.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    options: Cell<Options>,
    store: DocumentStore,
    console: Console,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, options: Options, console: Console) -> Self {
        Self {
            root: root.into(),
            options: Cell::new(options),
            store: DocumentStore::new(),
            console,
        }
    }

    /// Open the project at `root`, layering `[tool.usekit]` settings under
    /// `overrides`.
    pub fn open(root: impl Into<PathBuf>, overrides: &OptionOverrides, console: Console) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::ProjectNotFound { path: root });
        }
        let project = Self::new(root, Options::default(), console);
        let settings = pyproject::usekit_settings(&project)?;
        let options = Options::layered(settings.as_ref(), overrides)?;
        tracing::debug!(root = %project.root.display(), ?options, "opened project");
        project.options.set(options);
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a project file
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn has_file(&self, relative: &str) -> bool {
        self.path(relative).is_file()
    }

    /// Directory name, used when the manifest does not name the project
    pub fn dir_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .or_else(|| {
                canonical_dir(&self.root)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "project".to_string())
    }

    pub fn options(&self) -> Options {
        self.options.get()
    }

    /// Apply `overrides` until the returned guard is dropped.
    pub fn override_options(&self, overrides: &OptionOverrides) -> OptionsGuard<'_> {
        let previous = self.options.get();
        self.options.set(overrides.apply(previous));
        OptionsGuard {
            project: self,
            previous,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn tick(&self, message: &str) {
        self.console.emit(Style::Tick, message, self.options().quiet);
    }

    pub fn todo(&self, message: &str) {
        self.console.emit(Style::Todo, message, self.options().quiet);
    }

    pub fn warn(&self, message: &str) {
        self.console.emit(Style::Warn, message, self.options().quiet);
    }

    pub fn error(&self, message: &str) {
        self.console.emit(Style::Error, message, self.options().quiet);
    }
}

fn canonical_dir(path: &Path) -> PathBuf {
    usekit_fs::NormalizedPath::new(path).canonical().to_native()
}

/// Restores the options in effect before [`Project::override_options`].
#[derive(Debug)]
pub struct OptionsGuard<'p> {
    project: &'p Project,
    previous: Options,
}

impl Drop for OptionsGuard<'_> {
    fn drop(&mut self) {
        self.project.options.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BackendKind;
    use tempfile::TempDir;

    #[test]
    fn test_override_guard_restores_previous_options() {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path(), Options::default(), Console::captured());
        {
            let _guard = project.override_options(&OptionOverrides {
                quiet: Some(true),
                backend: Some(BackendKind::Disabled),
                ..OptionOverrides::default()
            });
            assert!(project.options().quiet);
            project.tick("hidden");
        }
        assert_eq!(project.options(), Options::default());
        project.tick("shown");
        assert_eq!(project.console().lines(), vec!["✔ shown"]);
    }

    #[test]
    fn test_open_reads_tool_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.usekit]\nbackend = \"none\"\nquiet = true\n",
        )
        .unwrap();
        let overrides = OptionOverrides {
            quiet: Some(false),
            ..OptionOverrides::default()
        };
        let project = Project::open(dir.path(), &overrides, Console::captured()).unwrap();
        assert_eq!(project.options().backend, BackendKind::Disabled);
        assert!(!project.options().quiet);
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = Project::open(dir.path().join("nope"), &OptionOverrides::default(), Console::captured())
            .unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
    }
}
