//! pre-commit, the git hook manager
//!
//! While pre-commit is in use the other tools run as hooks, so adding it
//! moves their checks out of the CI pipeline and removing it moves them
//! back.

use usekit_core::{Dependency, Project, deps, pipelines, precommit};

use crate::error::Result;
use crate::registry::ToolRegistry;
use crate::tool::{CiStep, ConfigLocation, Tool};

#[derive(Debug, Default, Clone, Copy)]
pub struct PreCommit;

impl Tool for PreCommit {
    fn name(&self) -> &'static str {
        "pre-commit"
    }

    fn display_name(&self) -> &'static str {
        "pre-commit"
    }

    fn description(&self) -> &'static str {
        "Run checks as git hooks before each commit"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("pre-commit")]
    }

    fn managed_files(&self) -> Vec<&'static str> {
        vec![precommit::PRE_COMMIT_CONFIG]
    }

    fn config_locations(&self) -> Vec<ConfigLocation> {
        Vec::new()
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv(
            "Run pre-commit",
            &["uv run --frozen pre-commit run --all-files"],
        )]
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run pre-commit install' to register pre-commit with git.".to_string())
    }

    fn add(&self, project: &Project, registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "adding tool");
        deps::add_dependencies(project, &self.dev_dependencies(), self.dependency_group())?;

        let others = registry.used_except(project, self.name())?;
        for tool in &others {
            if let Some(repo) = tool.pre_commit_repo() {
                precommit::add_repo(project, repo)?;
            }
        }
        precommit::ensure_config(project)?;

        if pipelines::is_used(project) {
            for tool in others.iter().filter(|tool| tool.pre_commit_repo().is_some()) {
                for ci in tool.ci_steps() {
                    pipelines::remove_step(project, ci.name())?;
                }
            }
            for ci in self.ci_steps() {
                pipelines::add_step(project, ci.step, &ci.caches)?;
            }
        }

        if let Some(message) = self.how_to_use() {
            project.todo(&message);
        }
        Ok(())
    }

    fn remove(&self, project: &Project, registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "removing tool");
        if pipelines::is_used(project) {
            for ci in self.ci_steps() {
                pipelines::remove_step(project, ci.name())?;
            }
            for tool in registry.used_except(project, self.name())? {
                for ci in tool.ci_steps() {
                    pipelines::add_step(project, ci.step, &ci.caches)?;
                }
            }
        }
        precommit::remove_pre_commit_config(project)?;
        deps::remove_dependencies(project, &self.dev_dependencies(), self.dependency_group())?;
        Ok(())
    }
}
