//! Top-level commands
//!
//! Each command holds `pyproject.toml` open while it runs, so the many
//! edits a command makes to it share one in-memory copy and reach the disk
//! in a single write when the command finishes.

use usekit_content::OpenMode;
use usekit_core::Project;
use usekit_core::pyproject::PYPROJECT_TOML;

use crate::error::{Error, Result};
use crate::registry::ToolRegistry;
use crate::rules::Linter;
use crate::tool::Tool;
use crate::tools::Ruff;

/// Whether a command adds or removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove,
}

/// One row of `usekit list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub used: bool,
}

fn in_scope<T>(project: &Project, command: impl FnOnce() -> Result<T>) -> Result<T> {
    let scope = if project.has_file(PYPROJECT_TOML) {
        Some(project.store().open(project.path(PYPROJECT_TOML), OpenMode::Existing)?)
    } else {
        None
    };
    let result = command();
    if let Err(err) = &result {
        tracing::warn!(error = %err, "command failed");
    }
    if let Some(scope) = scope {
        scope.close()?;
    }
    result
}

/// Add or remove the tool called `name`.
pub fn use_tool(project: &Project, registry: &ToolRegistry, name: &str, action: Action) -> Result<()> {
    let tool = registry.require(name)?;
    tracing::info!(tool = name, ?action, "use tool");
    in_scope(project, || match action {
        Action::Add => tool.add(project, registry),
        Action::Remove => tool.remove(project, registry),
    })
}

/// Rule codes look like `E`, `E501` or `PLR2004`.
fn validate_rules(rules: &[String]) -> Result<()> {
    for rule in rules {
        let valid = rule.chars().next().is_some_and(|first| first.is_ascii_uppercase())
            && rule.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid {
            return Err(Error::InvalidRule { rule: rule.clone() });
        }
    }
    Ok(())
}

fn ensure_linter(project: &Project, registry: &ToolRegistry) -> Result<()> {
    if !Ruff.is_used(project)? {
        registry.require(Ruff.name())?.add(project, registry)?;
    }
    Ok(())
}

/// Select `rules`, adding Ruff first when the project does not use it.
pub fn select_rules(project: &Project, registry: &ToolRegistry, rules: &[String]) -> Result<()> {
    validate_rules(rules)?;
    in_scope(project, || {
        ensure_linter(project, registry)?;
        Ruff.select_rules(project, rules)?;
        Ok(())
    })
}

/// Ignore `rules`, adding Ruff first when the project does not use it.
pub fn ignore_rules(project: &Project, registry: &ToolRegistry, rules: &[String]) -> Result<()> {
    validate_rules(rules)?;
    in_scope(project, || {
        ensure_linter(project, registry)?;
        Ruff.ignore_rules(project, rules)?;
        Ok(())
    })
}

/// Deselect `rules`. Nothing happens when the project does not use Ruff.
pub fn deselect_rules(project: &Project, rules: &[String]) -> Result<()> {
    validate_rules(rules)?;
    in_scope(project, || {
        if Ruff.is_used(project)? {
            Ruff.deselect_rules(project, rules)?;
        }
        Ok(())
    })
}

/// Stop ignoring `rules`. Nothing happens when the project does not use Ruff.
pub fn unignore_rules(project: &Project, rules: &[String]) -> Result<()> {
    validate_rules(rules)?;
    in_scope(project, || {
        if Ruff.is_used(project)? {
            Ruff.unignore_rules(project, rules)?;
        }
        Ok(())
    })
}

/// Every registered tool and whether the project uses it, in catalogue order.
pub fn status(project: &Project, registry: &ToolRegistry) -> Result<Vec<ToolStatus>> {
    in_scope(project, || {
        registry
            .iter()
            .map(|tool| -> Result<ToolStatus> {
                Ok(ToolStatus {
                    name: tool.name(),
                    description: tool.description(),
                    used: tool.is_used(project)?,
                })
            })
            .collect()
    })
}
