//! The `Tool` capability trait
//!
//! A tool describes what it needs (dependencies, configuration, a
//! pre-commit hook, CI steps, linter rules) and the default `add` / `remove`
//! implementations compose those capabilities:
//!
//! - when pre-commit is in use the tool's hook is added and its CI step is not
//! - otherwise its CI steps are added when Bitbucket Pipelines is in use
//! - its rule set goes to the linter when the linter is in use

use indexmap::IndexMap;
use serde_json::Value;
use usekit_content::{KeyPath, OpenMode};
use usekit_core::deps::{self, DEV_GROUP};
use usekit_core::pyproject::PYPROJECT_TOML;
use usekit_core::{Dependency, Project, pipelines, precommit};
use usekit_model::models::pipelines::{Cache, CacheDetails, CacheKey, ScriptItem, Step};
use usekit_model::models::precommit::Repo;

use crate::error::Result;
use crate::registry::ToolRegistry;
use crate::rules::{Linter, RuleSet};
use crate::tools::ruff::Ruff;

/// A file holding a tool's configuration, and the key its section lives
/// under (the root for dedicated files such as `ruff.toml`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLocation {
    pub file: &'static str,
    pub section: KeyPath,
}

impl ConfigLocation {
    /// A `[tool.<name>]` section of `pyproject.toml`
    pub fn pyproject(name: &str) -> Self {
        Self {
            file: PYPROJECT_TOML,
            section: KeyPath::new(["tool", name]),
        }
    }

    /// A file dedicated to the tool
    pub fn dedicated(file: &'static str) -> Self {
        Self {
            file,
            section: KeyPath::root(),
        }
    }

    pub fn is_dedicated(&self) -> bool {
        self.section.is_empty()
    }

    /// Whether the file exists and holds the section
    pub fn is_present(&self, project: &Project) -> Result<bool> {
        if !project.has_file(self.file) {
            return Ok(false);
        }
        if self.is_dedicated() {
            return Ok(true);
        }
        let doc = project.store().open(project.path(self.file), OpenMode::Existing)?;
        let present = doc.contains(&self.section);
        doc.close()?;
        Ok(present)
    }

    /// Absolute key of `key` within this location
    pub fn key(&self, key: &KeyPath) -> KeyPath {
        self.section.join(key)
    }
}

/// A configuration value a tool sets when it is added
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    /// Key relative to the tool's section
    pub key: KeyPath,
    pub value: Value,
}

impl ConfigEntry {
    pub fn new(key: &str, value: Value) -> Self {
        Self {
            key: KeyPath::parse(key),
            value,
        }
    }
}

/// A Bitbucket Pipelines step and the cache definitions it uses
#[derive(Debug, Clone, PartialEq)]
pub struct CiStep {
    pub step: Step,
    pub caches: IndexMap<String, Cache>,
}

impl CiStep {
    /// A step that installs uv and runs `commands`, caching uv's downloads.
    pub fn uv(name: &str, commands: &[&str]) -> Self {
        let mut script: Vec<ScriptItem> = vec![
            "curl -LsSf https://astral.sh/uv/install.sh | sh".into(),
            "source $HOME/.local/bin/env".into(),
        ];
        script.extend(commands.iter().map(|command| ScriptItem::from(*command)));
        let cache = Cache::Detailed(CacheDetails {
            path: "~/.cache/uv".to_string(),
            key: Some(CacheKey {
                files: vec!["uv.lock".to_string()],
            }),
        });
        Self {
            step: Step {
                name: Some(name.to_string()),
                caches: Some(vec!["uv".to_string()]),
                script,
                ..Step::default()
            },
            caches: IndexMap::from([("uv".to_string(), cache)]),
        }
    }

    pub fn name(&self) -> &str {
        self.step.name.as_deref().unwrap_or_default()
    }
}

/// A development tool usekit can add to or remove from a project
pub trait Tool {
    /// Identifier used on the command line
    fn name(&self) -> &'static str;

    /// Human readable name used in messages
    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn dev_dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    fn dependency_group(&self) -> &'static str {
        DEV_GROUP
    }

    /// Files owned by the tool, deleted when it is removed
    fn managed_files(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Candidate configuration locations, most preferred first. The last
    /// one is used when none exists yet.
    fn config_locations(&self) -> Vec<ConfigLocation> {
        vec![ConfigLocation::pyproject(self.name())]
    }

    fn config_entries(&self, _project: &Project) -> Result<Vec<ConfigEntry>> {
        Ok(Vec::new())
    }

    fn pre_commit_repo(&self) -> Option<Repo> {
        None
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        Vec::new()
    }

    fn rule_set(&self) -> RuleSet {
        RuleSet::default()
    }

    /// Next step for the user after adding the tool
    fn how_to_use(&self) -> Option<String> {
        None
    }

    fn is_used(&self, project: &Project) -> Result<bool> {
        for dependency in self.dev_dependencies() {
            let bare = Dependency::new(dependency.name);
            if deps::is_declared(project, &bare, self.dependency_group())? {
                return Ok(true);
            }
        }
        if self.managed_files().iter().any(|file| project.has_file(file)) {
            return Ok(true);
        }
        for location in self.config_locations() {
            if location.is_present(project)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The location configuration is written to
    fn active_config(&self, project: &Project) -> Option<ConfigLocation> {
        let locations = self.config_locations();
        locations
            .iter()
            .find(|location| project.has_file(location.file))
            .or(locations.last())
            .cloned()
    }

    fn add(&self, project: &Project, _registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "adding tool");
        deps::add_dependencies(project, &self.dev_dependencies(), self.dependency_group())?;
        add_config(self, project)?;
        add_integrations(self, project)?;
        add_rules(self, project)?;
        if let Some(message) = self.how_to_use() {
            project.todo(&message);
        }
        Ok(())
    }

    fn remove(&self, project: &Project, _registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "removing tool");
        remove_integrations(self, project)?;
        remove_rules(self, project)?;
        remove_config(self, project)?;
        deps::remove_dependencies(project, &self.dev_dependencies(), self.dependency_group())?;
        remove_managed_files(self, project)
    }
}

// ============================================================================
// Composition steps shared by the default implementations
// ============================================================================

/// Set every config entry not already present.
pub fn add_config<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    let entries = tool.config_entries(project)?;
    let Some(location) = tool.active_config(project) else {
        return Ok(());
    };
    if entries.is_empty() {
        return Ok(());
    }
    let doc = project
        .store()
        .open(project.path(location.file), OpenMode::CreateIfMissing)?;
    let mut changed = false;
    for entry in entries {
        let key = location.key(&entry.key);
        if !doc.contains(&key) {
            tracing::debug!(tool = tool.name(), key = %key, "setting config entry");
            doc.set(&key, entry.value, false)?;
            changed = true;
        }
    }
    doc.close()?;
    if changed {
        project.tick(&format!("Adding {} config to '{}'.", tool.display_name(), location.file));
    }
    Ok(())
}

/// Remove the tool's section from every location holding it.
pub fn remove_config<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    for location in tool.config_locations() {
        if !location.is_present(project)? {
            continue;
        }
        if location.is_dedicated() {
            project.store().remove_file(project.path(location.file))?;
        } else {
            let doc = project.store().open(project.path(location.file), OpenMode::Existing)?;
            doc.delete(&location.section)?;
            doc.close()?;
        }
        project.tick(&format!("Removing {} config from '{}'.", tool.display_name(), location.file));
    }
    Ok(())
}

/// Add the tool's hook when pre-commit is in use, its CI steps otherwise.
pub fn add_integrations<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    let hook = tool.pre_commit_repo().filter(|_| precommit::is_used(project));
    if let Some(repo) = hook {
        precommit::add_repo(project, repo)?;
    } else if pipelines::is_used(project) {
        for ci in tool.ci_steps() {
            pipelines::add_step(project, ci.step, &ci.caches)?;
        }
    }
    Ok(())
}

pub fn remove_integrations<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    if let Some(repo) = tool.pre_commit_repo() {
        for id in repo.hook_ids() {
            precommit::remove_hook(project, id)?;
        }
    }
    for ci in tool.ci_steps() {
        pipelines::remove_step(project, ci.name())?;
    }
    Ok(())
}

fn add_rules<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    let rules = tool.rule_set();
    if rules.is_empty() || !Ruff.is_used(project)? {
        return Ok(());
    }
    Ruff.apply_rule_set(project, &rules)
}

fn remove_rules<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    let rules = tool.rule_set();
    if rules.is_empty() || !Ruff.is_used(project)? {
        return Ok(());
    }
    Ruff.remove_rule_set(project, &rules)
}

fn remove_managed_files<T: Tool + ?Sized>(tool: &T, project: &Project) -> Result<()> {
    for file in tool.managed_files() {
        if project.store().remove_file(project.path(file))? {
            project.tick(&format!("Removing '{file}'."));
        }
    }
    Ok(())
}
