//! codespell, the spell checker for source code

use serde_json::json;
use usekit_core::{Dependency, Project};
use usekit_model::models::precommit::{HookDefinition, Repo};

use crate::error::Result;
use crate::tool::{CiStep, ConfigEntry, Tool};

const REPO: &str = "https://github.com/codespell-project/codespell";
const REV: &str = "v2.4.1";

#[derive(Debug, Default, Clone, Copy)]
pub struct Codespell;

impl Tool for Codespell {
    fn name(&self) -> &'static str {
        "codespell"
    }

    fn display_name(&self) -> &'static str {
        "Codespell"
    }

    fn description(&self) -> &'static str {
        "Find common misspellings in text files"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("codespell")]
    }

    fn config_entries(&self, _project: &Project) -> Result<Vec<ConfigEntry>> {
        Ok(vec![ConfigEntry::new("ignore-regex", json!(["[A-Za-z0-9+/]{100,}"]))])
    }

    fn pre_commit_repo(&self) -> Option<Repo> {
        Some(Repo {
            repo: REPO.to_string(),
            rev: Some(REV.to_string()),
            hooks: vec![HookDefinition {
                id: "codespell".to_string(),
                additional_dependencies: Some(vec!["tomli".to_string()]),
                ..HookDefinition::default()
            }],
        })
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv("Run Codespell", &["uv run --frozen codespell"])]
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run codespell' to run the Codespell spellchecker.".to_string())
    }
}
