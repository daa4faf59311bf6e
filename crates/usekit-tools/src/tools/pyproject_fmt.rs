//! pyproject-fmt, the `pyproject.toml` formatter

use serde_json::json;
use usekit_core::{Dependency, Project};
use usekit_model::models::precommit::{HookDefinition, Repo};

use crate::error::Result;
use crate::tool::{CiStep, ConfigEntry, Tool};

const REPO: &str = "https://github.com/tox-dev/pyproject-fmt";
const REV: &str = "v2.5.1";

#[derive(Debug, Default, Clone, Copy)]
pub struct PyprojectFmt;

impl Tool for PyprojectFmt {
    fn name(&self) -> &'static str {
        "pyproject-fmt"
    }

    fn display_name(&self) -> &'static str {
        "pyproject-fmt"
    }

    fn description(&self) -> &'static str {
        "Apply a consistent format to pyproject.toml"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("pyproject-fmt")]
    }

    fn config_entries(&self, _project: &Project) -> Result<Vec<ConfigEntry>> {
        Ok(vec![ConfigEntry::new("keep_full_version", json!(true))])
    }

    fn pre_commit_repo(&self) -> Option<Repo> {
        Some(Repo {
            repo: REPO.to_string(),
            rev: Some(REV.to_string()),
            hooks: vec![HookDefinition {
                id: "pyproject-fmt".to_string(),
                ..HookDefinition::default()
            }],
        })
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv(
            "Run pyproject-fmt",
            &["uv run --frozen pyproject-fmt pyproject.toml"],
        )]
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run pyproject-fmt pyproject.toml' to run pyproject-fmt.".to_string())
    }
}
