//! deptry, the dependency checker

use usekit_core::Dependency;
use usekit_model::models::precommit::{HookDefinition, LOCAL_REPO, Repo};

use crate::tool::{CiStep, Tool};

#[derive(Debug, Default, Clone, Copy)]
pub struct Deptry;

impl Tool for Deptry {
    fn name(&self) -> &'static str {
        "deptry"
    }

    fn display_name(&self) -> &'static str {
        "deptry"
    }

    fn description(&self) -> &'static str {
        "Find missing, unused and transitive dependencies"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("deptry")]
    }

    fn pre_commit_repo(&self) -> Option<Repo> {
        Some(Repo {
            repo: LOCAL_REPO.to_string(),
            rev: None,
            hooks: vec![HookDefinition {
                always_run: Some(true),
                pass_filenames: Some(false),
                ..HookDefinition::system("deptry", "deptry", "uv run --frozen --offline deptry src")
            }],
        })
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv("Run deptry", &["uv run --frozen deptry src"])]
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run deptry src' to run deptry.".to_string())
    }
}
