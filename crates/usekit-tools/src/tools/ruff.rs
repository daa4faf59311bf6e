//! Ruff, the linter and formatter

use serde_json::json;
use usekit_core::{Dependency, Project};
use usekit_model::models::precommit::{HookDefinition, LOCAL_REPO, Repo};

use crate::error::Result;
use crate::registry::ToolRegistry;
use crate::rules::{Linter, RuleSet};
use crate::tool::{self, CiStep, ConfigEntry, ConfigLocation, Tool};

#[derive(Debug, Default, Clone, Copy)]
pub struct Ruff;

impl Ruff {
    fn hook(id: &str, command: &str) -> HookDefinition {
        HookDefinition {
            types_or: Some(vec!["python".to_string(), "pyi".to_string(), "jupyter".to_string()]),
            require_serial: Some(true),
            ..HookDefinition::system(id, id, &format!("uv run --frozen --offline {command}"))
        }
    }
}

impl Tool for Ruff {
    fn name(&self) -> &'static str {
        "ruff"
    }

    fn display_name(&self) -> &'static str {
        "Ruff"
    }

    fn description(&self) -> &'static str {
        "Lint and format Python code"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("ruff")]
    }

    fn config_locations(&self) -> Vec<ConfigLocation> {
        vec![
            ConfigLocation::dedicated(".ruff.toml"),
            ConfigLocation::dedicated("ruff.toml"),
            ConfigLocation::pyproject("ruff"),
        ]
    }

    fn config_entries(&self, _project: &Project) -> Result<Vec<ConfigEntry>> {
        Ok(vec![ConfigEntry::new("line-length", json!(88))])
    }

    fn pre_commit_repo(&self) -> Option<Repo> {
        Some(Repo {
            repo: LOCAL_REPO.to_string(),
            rev: None,
            hooks: vec![
                Self::hook("ruff", "ruff check --fix --force-exclude"),
                Self::hook("ruff-format", "ruff format --force-exclude"),
            ],
        })
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv(
            "Run Ruff",
            &["uv run --frozen ruff check --fix", "uv run --frozen ruff format"],
        )]
    }

    fn rule_set(&self) -> RuleSet {
        RuleSet::selecting(&["A", "C4", "E4", "E7", "E9", "F", "FURB", "I", "PLE", "PLR", "RUF", "SIM", "UP"])
            .with_ignored(&["PLR2004", "SIM108"])
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run ruff check --fix' to run the Ruff linter with autofixes.".to_string())
    }

    /// The rule lists go with the section, so they are not deselected one by
    /// one first.
    fn remove(&self, project: &Project, _registry: &ToolRegistry) -> Result<()> {
        tracing::info!(tool = self.name(), "removing tool");
        tool::remove_integrations(self, project)?;
        tool::remove_config(self, project)?;
        usekit_core::deps::remove_dependencies(project, &self.dev_dependencies(), self.dependency_group())?;
        Ok(())
    }
}

impl Linter for Ruff {
    fn linter_name(&self) -> &'static str {
        "Ruff"
    }

    fn rules_location(&self, project: &Project) -> ConfigLocation {
        self.active_config(project)
            .unwrap_or_else(|| ConfigLocation::pyproject("ruff"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use usekit_core::{BackendKind, Console, Options};
    use usekit_test_utils::TestProject;

    fn project(fixture: &TestProject) -> Project {
        let options = Options {
            backend: BackendKind::Disabled,
            ..Options::default()
        };
        Project::new(fixture.root(), options, Console::captured())
    }

    #[test]
    fn test_rules_go_to_dedicated_file_without_prefix() {
        let fixture = TestProject::new()
            .with_pyproject("demo")
            .with_file("ruff.toml", "line-length = 100\n");
        let project = project(&fixture);
        Ruff.select_rules(&project, &["E4".to_string()]).unwrap();
        fixture.assert_file_contains("ruff.toml", "[lint]\nselect = [\"E4\"]");
        fixture.assert_file_not_contains("pyproject.toml", "ruff");
    }

    #[test]
    fn test_rules_default_to_pyproject() {
        let fixture = TestProject::new().with_pyproject("demo");
        let project = project(&fixture);
        Ruff.select_rules(&project, &["E4".to_string(), "F".to_string()]).unwrap();
        Ruff.ignore_rules(&project, &["E501".to_string()]).unwrap();
        assert_eq!(Ruff.selected_rules(&project).unwrap(), vec!["E4", "F"]);
        assert_eq!(Ruff.ignored_rules(&project).unwrap(), vec!["E501"]);
        assert_eq!(
            project.console().lines(),
            vec![
                "✔ Selecting Ruff rules 'E4', 'F' in 'pyproject.toml'.",
                "✔ Ignoring Ruff rule 'E501' in 'pyproject.toml'.",
            ]
        );
    }

    #[test]
    fn test_remove_rule_set_keeps_unmanaged_rules() {
        let fixture = TestProject::new().with_pyproject("demo");
        let project = project(&fixture);
        let rules = RuleSet::selecting(&["PT"]).with_unmanaged_selected(&["S"]);
        Ruff.apply_rule_set(&project, &rules).unwrap();
        assert_eq!(Ruff.selected_rules(&project).unwrap(), vec!["PT", "S"]);
        Ruff.remove_rule_set(&project, &rules).unwrap();
        assert_eq!(Ruff.selected_rules(&project).unwrap(), vec!["S"]);
    }
}
