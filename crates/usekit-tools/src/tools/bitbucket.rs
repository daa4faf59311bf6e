//! Bitbucket Pipelines, the CI service

use usekit_core::{Project, pipelines, precommit};

use crate::error::Result;
use crate::registry::ToolRegistry;
use crate::tool::{ConfigLocation, Tool};

#[derive(Debug, Default, Clone, Copy)]
pub struct BitbucketPipelines;

impl Tool for BitbucketPipelines {
    fn name(&self) -> &'static str {
        "bitbucket"
    }

    fn display_name(&self) -> &'static str {
        "Bitbucket Pipelines"
    }

    fn description(&self) -> &'static str {
        "Run the project's checks in Bitbucket Pipelines"
    }

    fn managed_files(&self) -> Vec<&'static str> {
        vec![pipelines::BITBUCKET_PIPELINES]
    }

    fn config_locations(&self) -> Vec<ConfigLocation> {
        Vec::new()
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run your pipeline via the Bitbucket website.".to_string())
    }

    /// Steps come from the tools in use; with pre-commit in use only its
    /// step is added since it runs the others.
    fn add(&self, project: &Project, registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "adding tool");
        pipelines::ensure_config(project)?;
        let tools = registry.used_except(project, self.name())?;
        for tool in tools {
            if precommit::is_used(project) && tool.pre_commit_repo().is_some() {
                continue;
            }
            for ci in tool.ci_steps() {
                pipelines::add_step(project, ci.step, &ci.caches)?;
            }
        }
        if let Some(message) = self.how_to_use() {
            project.todo(&message);
        }
        Ok(())
    }

    fn remove(&self, project: &Project, _registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "removing tool");
        pipelines::remove_pipelines(project)?;
        Ok(())
    }
}
