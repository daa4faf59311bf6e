//! End-to-end tool scenarios against real project directories

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use usekit_core::pipelines::{self, BITBUCKET_PIPELINES, PLACEHOLDER_STEP_NAME};
use usekit_core::precommit::{self, PRE_COMMIT_CONFIG};
use usekit_core::pyproject::PYPROJECT_TOML;
use usekit_core::{BackendKind, Console, OptionOverrides, Project};
use usekit_test_utils::TestProject;
use usekit_tools::commands::{self, Action};
use usekit_tools::tools::Ruff;
use usekit_tools::{Error, Linter, ToolRegistry};

fn open(fixture: &TestProject) -> Project {
    let overrides = OptionOverrides {
        backend: Some(BackendKind::Disabled),
        ..OptionOverrides::default()
    };
    Project::open(fixture.root(), &overrides, Console::captured()).unwrap()
}

fn rules(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|code| code.to_string()).collect()
}

// =============================================================================
// Adding and removing tools
// =============================================================================

#[test]
fn test_add_ruff_configures_pyproject() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "ruff", Action::Add).unwrap();

    fixture.assert_file_contains(PYPROJECT_TOML, "dev = [\"ruff\"]");
    fixture.assert_file_contains(PYPROJECT_TOML, "line-length = 88");
    let selected = Ruff.selected_rules(&project).unwrap();
    assert!(selected.contains(&"E4".to_string()), "{selected:?}");
    assert_eq!(Ruff.ignored_rules(&project).unwrap(), vec!["PLR2004", "SIM108"]);
    assert!(
        project
            .console()
            .lines()
            .contains(&"☐ Run 'uv run ruff check --fix' to run the Ruff linter with autofixes.".to_string())
    );
}

#[test]
fn test_add_then_remove_ruff_leaves_no_trace() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "ruff", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "ruff", Action::Remove).unwrap();

    fixture.assert_file_not_contains(PYPROJECT_TOML, "ruff");
    fixture.assert_file_contains(PYPROJECT_TOML, "name = \"demo\"");
}

#[test]
fn test_add_is_idempotent() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "pytest", Action::Add).unwrap();
    let once = fixture.read(PYPROJECT_TOML);
    commands::use_tool(&project, &registry, "pytest", Action::Add).unwrap();
    assert_eq!(fixture.read(PYPROJECT_TOML), once);
    fixture.assert_file_contains(PYPROJECT_TOML, "test = [\"pytest\"]");
}

#[test]
fn test_coverage_source_uses_import_name() {
    let fixture = TestProject::new().with_pyproject("my-package");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "coverage", Action::Add).unwrap();
    fixture.assert_file_contains(PYPROJECT_TOML, "source = [\"my_package\"]");
    fixture.assert_file_contains(PYPROJECT_TOML, "coverage[toml]");
}

#[test]
fn test_unknown_tool_lists_catalogue() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    let err = commands::use_tool(&project, &registry, "black", Action::Add).unwrap_err();
    assert!(matches!(err, Error::UnknownTool { .. }));
    assert!(err.to_string().contains("bitbucket"));
}

// =============================================================================
// Composition
// =============================================================================

#[test]
fn test_hook_added_when_pre_commit_in_use() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "pre-commit", Action::Add).unwrap();
    assert_eq!(precommit::hook_ids(&project).unwrap(), vec![precommit::PLACEHOLDER_HOOK_ID]);

    commands::use_tool(&project, &registry, "codespell", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "ruff", Action::Add).unwrap();
    assert_eq!(
        precommit::hook_ids(&project).unwrap(),
        vec!["ruff", "ruff-format", "codespell"]
    );

    commands::use_tool(&project, &registry, "codespell", Action::Remove).unwrap();
    assert_eq!(precommit::hook_ids(&project).unwrap(), vec!["ruff", "ruff-format"]);
}

#[test]
fn test_pre_commit_takes_over_ci_steps() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "deptry", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "bitbucket", Action::Add).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec!["Run deptry"]);

    commands::use_tool(&project, &registry, "pre-commit", Action::Add).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec!["Run pre-commit"]);
    assert_eq!(precommit::hook_ids(&project).unwrap(), vec!["deptry"]);

    commands::use_tool(&project, &registry, "pre-commit", Action::Remove).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec!["Run deptry"]);
    fixture.assert_file_not_exists(PRE_COMMIT_CONFIG);
    fixture.assert_file_not_contains(PYPROJECT_TOML, "pre-commit");
}

#[test]
fn test_tool_without_hook_keeps_ci_step_under_pre_commit() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "bitbucket", Action::Add).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec![PLACEHOLDER_STEP_NAME]);

    commands::use_tool(&project, &registry, "pre-commit", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "pytest", Action::Add).unwrap();
    assert_eq!(
        pipelines::step_names(&project).unwrap(),
        vec!["Run pre-commit", "Test with pytest"]
    );
}

#[test]
fn test_removing_last_step_restores_placeholder() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "bitbucket", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "deptry", Action::Add).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec!["Run deptry"]);
    fixture.assert_file_contains(BITBUCKET_PIPELINES, "caches:");

    commands::use_tool(&project, &registry, "deptry", Action::Remove).unwrap();
    assert_eq!(pipelines::step_names(&project).unwrap(), vec![PLACEHOLDER_STEP_NAME]);
    fixture.assert_file_not_contains(BITBUCKET_PIPELINES, "~/.cache/uv");

    commands::use_tool(&project, &registry, "bitbucket", Action::Remove).unwrap();
    fixture.assert_file_not_exists(BITBUCKET_PIPELINES);
}

#[test]
fn test_status_reports_used_tools_in_order() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "deptry", Action::Add).unwrap();
    let status = commands::status(&project, &registry).unwrap();
    let used: Vec<&str> = status.iter().filter(|row| row.used).map(|row| row.name).collect();
    assert_eq!(used, vec!["deptry"]);
    assert_eq!(status.len(), registry.len());
    assert_eq!(status[0].name, "pyproject-fmt");
}

// =============================================================================
// Rules
// =============================================================================

#[test]
fn test_select_adds_ruff_when_missing() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::select_rules(&project, &registry, &rules(&["PT"])).unwrap();
    fixture.assert_file_contains(PYPROJECT_TOML, "dev = [\"ruff\"]");
    let selected = Ruff.selected_rules(&project).unwrap();
    assert_eq!(selected.last().map(String::as_str), Some("PT"));
}

#[test]
fn test_deselect_without_ruff_changes_nothing() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let before = fixture.read(PYPROJECT_TOML);

    commands::deselect_rules(&project, &rules(&["E501"])).unwrap();
    commands::unignore_rules(&project, &rules(&["E501"])).unwrap();
    assert_eq!(fixture.read(PYPROJECT_TOML), before);
    assert!(project.console().lines().is_empty());
}

#[test]
fn test_ignore_then_unignore() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::ignore_rules(&project, &registry, &rules(&["E501"])).unwrap();
    assert!(Ruff.ignored_rules(&project).unwrap().contains(&"E501".to_string()));
    commands::unignore_rules(&project, &rules(&["E501"])).unwrap();
    assert!(!Ruff.ignored_rules(&project).unwrap().contains(&"E501".to_string()));
}

#[test]
fn test_unmanaged_rule_outlives_its_tool() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();

    commands::use_tool(&project, &registry, "ruff", Action::Add).unwrap();
    commands::use_tool(&project, &registry, "pytest", Action::Add).unwrap();
    assert!(Ruff.selected_rules(&project).unwrap().contains(&"PT".to_string()));

    commands::use_tool(&project, &registry, "pytest", Action::Remove).unwrap();
    assert!(Ruff.selected_rules(&project).unwrap().contains(&"PT".to_string()));
    fixture.assert_file_not_contains(PYPROJECT_TOML, "ini_options");
}

#[test]
fn test_invalid_rule_is_rejected_before_editing() {
    let fixture = TestProject::new().with_pyproject("demo");
    let project = open(&fixture);
    let registry = ToolRegistry::with_builtins();
    let before = fixture.read(PYPROJECT_TOML);

    let err = commands::select_rules(&project, &registry, &rules(&["E501", "bad rule"])).unwrap_err();
    assert!(matches!(err, Error::InvalidRule { .. }));
    assert_eq!(fixture.read(PYPROJECT_TOML), before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_selecting_twice_is_idempotent(codes in prop::collection::vec("[A-Z]{1,3}[0-9]{0,3}", 1..5)) {
        let fixture = TestProject::new().with_pyproject("demo");
        let project = open(&fixture);
        Ruff.select_rules(&project, &codes).unwrap();
        let once = fixture.read(PYPROJECT_TOML);
        let changed = Ruff.select_rules(&project, &codes).unwrap();
        prop_assert!(!changed);
        prop_assert_eq!(fixture.read(PYPROJECT_TOML), once);
    }
}
