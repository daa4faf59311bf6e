//! Store behaviour against real files

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use usekit_content::{DocumentStore, Error, KeyPath, OpenMode};

const PYPROJECT: &str = r#"# Project metadata
[project]
name = "demo"   # the package
version = "0.1.0"

[dependency-groups]
dev = [
    "pytest>=8",  # tests
]

[tool.ruff.lint]
select = ["E4", "E7"]  # keep short
"#;

const PRE_COMMIT: &str = "\
# See https://pre-commit.com
repos:
  - repo: local
    hooks:
      - id: ruff   # lint
        name: ruff
        entry: uv run ruff check
        language: system
";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[rstest]
#[case("pyproject.toml", PYPROJECT)]
#[case(".pre-commit-config.yaml", PRE_COMMIT)]
#[case("package.json", "{\n    \"name\": \"x\"\n}")]
fn test_open_close_round_trip_is_byte_identical(#[case] name: &str, #[case] content: &str) {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, name, content);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    let root = doc.root().unwrap();
    doc.set_root(root).unwrap();
    doc.close().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

#[test]
fn test_toml_list_edit_preserves_comments() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pyproject.toml", PYPROJECT);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    let select = KeyPath::parse("tool.ruff.lint.select");
    assert!(doc.extend_list(&select, &[json!("E7"), json!("F")]).unwrap());
    doc.close().unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# Project metadata\n[project]\nname = \"demo\"   # the package\n"));
    assert!(written.contains("\"pytest>=8\",  # tests"));
    assert!(written.contains("select = [\"E4\", \"E7\", \"F\"]  # keep short"));
}

#[test]
fn test_yaml_edit_keeps_leading_comment() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, ".pre-commit-config.yaml", PRE_COMMIT);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    doc.set(&KeyPath::parse("default_install_hook_types"), json!(["pre-commit"]), false)
        .unwrap();
    doc.close().unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# See https://pre-commit.com\nrepos:\n"));
    assert!(written.contains("- id: ruff   # lint"));
    assert!(written.ends_with("default_install_hook_types:\n- pre-commit\n"));
}

#[test]
fn test_yaml_list_edit_keeps_comments_inside_untouched_items() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, ".pre-commit-config.yaml", PRE_COMMIT);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    let added = doc
        .extend_list(
            &KeyPath::parse("repos"),
            &[json!({"repo": "meta", "hooks": [{"id": "check-useless-excludes"}]})],
        )
        .unwrap();
    assert!(added);
    doc.close().unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with(PRE_COMMIT), "{written}");
    assert!(written.ends_with("  - repo: meta\n    hooks:\n    - id: check-useless-excludes\n"));
}

#[test]
fn test_decode_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.toml", "[project\n");
    let store = DocumentStore::new();

    let err = store.open(&path, OpenMode::Existing).unwrap_err();
    match err {
        Error::Decode { path: reported, .. } => {
            assert_eq!(reported.file_name().unwrap(), "bad.toml");
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn test_delete_missing_value_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pyproject.toml", PYPROJECT);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    let err = doc.delete(&KeyPath::parse("tool.deptry")).unwrap_err();
    assert!(err.is_value_missing());
    assert!(!doc.is_dirty().unwrap());
    doc.close().unwrap();
}

#[test]
fn test_delete_does_not_prune_parents() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "pyproject.toml", PYPROJECT);
    let store = DocumentStore::new();

    let doc = store.open(&path, OpenMode::Existing).unwrap();
    doc.delete(&KeyPath::parse("tool.ruff.lint.select")).unwrap();
    assert!(doc.contains(&KeyPath::parse("tool.ruff.lint")));
    doc.close().unwrap();
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extend_list_is_idempotent(
            first in prop::collection::vec("[A-Z][0-9]{0,2}", 0..6),
            second in prop::collection::vec("[A-Z][0-9]{0,2}", 0..6),
        ) {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("pyproject.toml");
            let store = DocumentStore::new();
            let select = KeyPath::parse("tool.ruff.lint.select");

            let doc = store.open(&path, OpenMode::CreateIfMissing).unwrap();
            let first: Vec<_> = first.into_iter().map(serde_json::Value::from).collect();
            let second: Vec<_> = second.into_iter().map(serde_json::Value::from).collect();
            doc.extend_list(&select, &first).unwrap();
            doc.extend_list(&select, &second).unwrap();
            let once = doc.get(&select).unwrap();
            prop_assert!(!doc.extend_list(&select, &second).unwrap());
            prop_assert_eq!(doc.get(&select).unwrap(), once.clone());

            let items = once.as_array().unwrap();
            for (i, item) in items.iter().enumerate() {
                prop_assert!(!items[..i].contains(item));
            }
            doc.close().unwrap();
        }
    }
}
