//! [`TestProject`] builder for usekit test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary Python project directory with helpers for setup and
/// assertions.
///
/// # Example
///
/// ```rust,no_run
/// use usekit_test_utils::TestProject;
///
/// let project = TestProject::new().with_pyproject("demo");
/// project.write(".pre-commit-config.yaml", "repos: []\n");
/// project.assert_file_contains("pyproject.toml", "name = \"demo\"");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a minimal `pyproject.toml` naming the project `name`.
    pub fn with_pyproject(self, name: &str) -> Self {
        self.write(
            "pyproject.toml",
            &format!("[project]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
        );
        self
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        self.write(relative, content);
        self
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }

    /// Read a project file.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    /// Assert that `relative` contains `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let actual = self.read(relative);
        assert!(
            actual.contains(content),
            "File {relative} does not contain expected content.\nExpected: {content}\nActual: {actual}"
        );
    }

    pub fn assert_file_not_contains(&self, relative: &str, content: &str) {
        let actual = self.read(relative);
        assert!(
            !actual.contains(content),
            "File {relative} unexpectedly contains: {content}\nActual: {actual}"
        );
    }
}
