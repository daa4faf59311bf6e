//! pytest, the test runner

use serde_json::json;
use usekit_core::{Dependency, Project};

use crate::error::Result;
use crate::rules::RuleSet;
use crate::tool::{CiStep, ConfigEntry, Tool};

pub const TEST_GROUP: &str = "test";

#[derive(Debug, Default, Clone, Copy)]
pub struct Pytest;

impl Tool for Pytest {
    fn name(&self) -> &'static str {
        "pytest"
    }

    fn display_name(&self) -> &'static str {
        "pytest"
    }

    fn description(&self) -> &'static str {
        "Run the test suite"
    }

    fn dev_dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("pytest")]
    }

    fn dependency_group(&self) -> &'static str {
        TEST_GROUP
    }

    fn config_entries(&self, _project: &Project) -> Result<Vec<ConfigEntry>> {
        Ok(vec![
            ConfigEntry::new("ini_options.testpaths", json!(["tests"])),
            ConfigEntry::new(
                "ini_options.addopts",
                json!(["--import-mode=importlib", "-ra", "--strict-markers", "--strict-config"]),
            ),
            ConfigEntry::new("ini_options.filterwarnings", json!(["error"])),
            ConfigEntry::new("ini_options.xfail_strict", json!(true)),
        ])
    }

    fn ci_steps(&self) -> Vec<CiStep> {
        vec![CiStep::uv("Test with pytest", &["uv run --frozen pytest"])]
    }

    /// `PT` stays selected when pytest goes: other test code may still use it.
    fn rule_set(&self) -> RuleSet {
        RuleSet::default().with_unmanaged_selected(&["PT"])
    }

    fn how_to_use(&self) -> Option<String> {
        Some("Add test files to the 'tests' directory and run them with 'uv run pytest'.".to_string())
    }
}
