//! `pyproject.toml` integration

use usekit_content::{DocumentGuard, KeyPath, OpenMode};
use usekit_model::models::{ProjectSection, UsekitSettings};
use usekit_model::validate;

use crate::error::Result;
use crate::project::Project;

pub const PYPROJECT_TOML: &str = "pyproject.toml";

/// Open `pyproject.toml`, creating it in memory if needed.
pub fn open(project: &Project) -> Result<DocumentGuard<'_>> {
    Ok(project
        .store()
        .open(project.path(PYPROJECT_TOML), OpenMode::CreateIfMissing)?)
}

/// The `[tool.usekit]` table, if the manifest has one.
pub fn usekit_settings(project: &Project) -> Result<Option<UsekitSettings>> {
    if !project.has_file(PYPROJECT_TOML) {
        return Ok(None);
    }
    let doc = open(project)?;
    let path = KeyPath::new(["tool", "usekit"]);
    let settings = if doc.contains(&path) {
        Some(validate::<UsekitSettings>(&doc.get(&path)?)?)
    } else {
        None
    };
    doc.close()?;
    Ok(settings)
}

/// The project name from `[project]`, or the directory name when the
/// manifest is missing or its project table is malformed.
pub fn project_name(project: &Project) -> Result<String> {
    if !project.has_file(PYPROJECT_TOML) {
        return Ok(project.dir_name());
    }
    let doc = open(project)?;
    let section = doc.get(&KeyPath::new(["project"]));
    doc.close()?;

    let name = section
        .map_err(crate::Error::from)
        .and_then(|value| Ok(validate::<ProjectSection>(&value)?.name));
    match name {
        Ok(name) => Ok(name),
        Err(e) => {
            tracing::debug!(error = %e, "no usable project name, using the directory name");
            Ok(project.dir_name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Console, Options};
    use tempfile::TempDir;

    fn project_with(content: Option<&str>) -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        if let Some(content) = content {
            std::fs::write(dir.path().join(PYPROJECT_TOML), content).unwrap();
        }
        let project = Project::new(dir.path(), Options::default(), Console::captured());
        (dir, project)
    }

    #[test]
    fn test_project_name_from_manifest() {
        let (_dir, project) = project_with(Some("[project]\nname = \"demo\"\n"));
        assert_eq!(project_name(&project).unwrap(), "demo");
    }

    #[test]
    fn test_project_name_falls_back_to_directory() {
        let (dir, project) = project_with(Some("[project]\nversion = \"1\"\n"));
        let expected = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(project_name(&project).unwrap(), expected);

        let (dir, project) = project_with(None);
        let expected = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(project_name(&project).unwrap(), expected);
    }

    #[test]
    fn test_malformed_manifest_is_an_error() {
        let (_dir, project) = project_with(Some("[project\n"));
        assert!(project_name(&project).is_err());
    }
}
