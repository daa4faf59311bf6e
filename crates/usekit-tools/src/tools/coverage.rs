//! Coverage.py, test coverage measurement

use serde_json::json;
use usekit_core::{Dependency, Project, pyproject};

use crate::error::Result;
use crate::tool::{ConfigEntry, Tool};
use crate::tools::pytest::TEST_GROUP;

#[derive(Debug, Default, Clone, Copy)]
pub struct Coverage;

impl Tool for Coverage {
    fn name(&self) -> &'static str {
        "coverage"
    }

    fn display_name(&self) -> &'static str {
        "Coverage.py"
    }

    fn description(&self) -> &'static str {
        "Measure test coverage"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::with_extras("coverage", ["toml"])]
    }

    fn dependency_group(&self) -> &'static str {
        TEST_GROUP
    }

    fn config_entries(&self, project: &Project) -> Result<Vec<ConfigEntry>> {
        let source = pyproject::project_name(project)?.replace('-', "_");
        Ok(vec![
            ConfigEntry::new("run.source", json!([source])),
            ConfigEntry::new("report.exclude_also", json!([
                "if TYPE_CHECKING:",
                "raise AssertionError",
                "raise NotImplementedError",
                "assert_never(.*)",
                "class .*\\bProtocol\\):",
                "@(abc\\.)?abstractmethod",
            ])),
            ConfigEntry::new("report.omit", json!(["*/pytest-of-*/*"])),
        ])
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Run 'uv run coverage run -m pytest' then 'uv run coverage report' to measure coverage.".to_string())
    }
}
