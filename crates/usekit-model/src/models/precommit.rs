//! `.pre-commit-config.yaml` schema

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::introspect::struct_fields;
use crate::ordering::{FieldOrder, Ordering, Shape};
use crate::projection::Model;

/// Repository name for hooks defined in the project itself
pub const LOCAL_REPO: &str = "local";

/// Repository name for pre-commit's built-in meta hooks
pub const META_REPO: &str = "meta";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreCommitConfig {
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<IndexMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_install_hook_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language_version: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_stages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_pre_commit_version: Option<String>,
}

/// One entry of `repos`: a remote repository pinned to a revision, or the
/// `local` / `meta` pseudo-repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

impl Repo {
    pub fn is_local(&self) -> bool {
        self.repo == LOCAL_REPO
    }

    pub fn hook_ids(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|hook| hook.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types_or: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_filenames: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_run: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_serial: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl HookDefinition {
    /// A hook run from the project's own environment
    pub fn system(id: &str, name: &str, entry: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(name.to_string()),
            entry: Some(entry.to_string()),
            language: Some("system".to_string()),
            ..Self::default()
        }
    }
}

// ===========================================================================
// Canonical order
// ===========================================================================

/// Remote repositories pair by URL. `local` and `meta` entries pair on any
/// hook id they share, so removing one of their hooks keeps the rest in
/// place.
fn repo_identity(value: &Value) -> Vec<String> {
    let Some(repo) = value.get("repo").and_then(Value::as_str) else {
        return Vec::new();
    };
    if repo != LOCAL_REPO && repo != META_REPO {
        return vec![repo.to_string()];
    }
    value
        .get("hooks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(hook_id)
        .map(|id| format!("{repo}:{id}"))
        .collect()
}

fn hook_id(value: &Value) -> Option<&str> {
    value.get("id")?.as_str()
}

fn hook_identity(value: &Value) -> Vec<String> {
    hook_id(value).map(str::to_string).into_iter().collect()
}

static HOOK_SHAPE: Shape = Shape::Model(&HOOK_ORDER);
static HOOKS: Shape = Shape::SeqOf(&HOOK_SHAPE, Some(hook_identity));
static REPO_SHAPE: Shape = Shape::Model(&REPO_ORDER);
static REPOS: Shape = Shape::SeqOf(&REPO_SHAPE, Some(repo_identity));

pub static HOOK_ORDER: Ordering = Ordering {
    model: "pre-commit hook",
    schema: struct_fields::<HookDefinition>,
    fields: &[
        FieldOrder::plain("id"),
        FieldOrder::plain("alias"),
        FieldOrder::plain("name"),
        FieldOrder::plain("entry"),
        FieldOrder::plain("language"),
        FieldOrder::plain("language_version"),
        FieldOrder::plain("args"),
        FieldOrder::plain("files"),
        FieldOrder::plain("exclude"),
        FieldOrder::plain("types"),
        FieldOrder::plain("types_or"),
        FieldOrder::plain("exclude_types"),
        FieldOrder::plain("pass_filenames"),
        FieldOrder::plain("always_run"),
        FieldOrder::plain("require_serial"),
        FieldOrder::plain("additional_dependencies"),
        FieldOrder::plain("stages"),
        FieldOrder::plain("verbose"),
        FieldOrder::plain("log_file"),
    ],
};

pub static REPO_ORDER: Ordering = Ordering {
    model: "pre-commit repository",
    schema: struct_fields::<Repo>,
    fields: &[
        FieldOrder::plain("repo"),
        FieldOrder::plain("rev"),
        FieldOrder::new("hooks", &HOOKS),
    ],
};

pub static CONFIG_ORDER: Ordering = Ordering {
    model: "pre-commit configuration",
    schema: struct_fields::<PreCommitConfig>,
    fields: &[
        FieldOrder::plain("ci"),
        FieldOrder::plain("default_install_hook_types"),
        FieldOrder::plain("default_language_version"),
        FieldOrder::plain("default_stages"),
        FieldOrder::plain("files"),
        FieldOrder::plain("exclude"),
        FieldOrder::plain("fail_fast"),
        FieldOrder::plain("minimum_pre_commit_version"),
        FieldOrder::new("repos", &REPOS),
    ],
};

impl Model for PreCommitConfig {
    const NAME: &'static str = "pre-commit configuration";

    fn ordering() -> &'static Ordering {
        &CONFIG_ORDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fancy_dump, validate};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_new_hook_fields_follow_canonical_order() {
        let mut config = PreCommitConfig::default();
        config.repos.push(Repo {
            repo: LOCAL_REPO.to_string(),
            rev: None,
            hooks: vec![HookDefinition::system("deptry", "deptry", "uv run deptry src")],
        });
        let dumped = fancy_dump(&config, None).unwrap();
        let hook = dumped["repos"][0]["hooks"][0].as_object().unwrap();
        let keys: Vec<_> = hook.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "entry", "language"]);
    }

    #[test]
    fn test_existing_repo_keeps_its_layout() {
        let reference = json!({
            "repos": [
                {"hooks": [{"id": "codespell", "args": ["-w"]}], "rev": "v2.3.0", "repo": "https://github.com/codespell-project/codespell"},
            ]
        });
        let mut config: PreCommitConfig = validate(&reference).unwrap();
        config.repos.insert(
            0,
            Repo {
                repo: LOCAL_REPO.to_string(),
                rev: None,
                hooks: vec![HookDefinition::system("ruff", "ruff", "uv run ruff check")],
            },
        );
        let dumped = fancy_dump(&config, Some(&reference)).unwrap();
        let kept: Vec<_> = dumped["repos"][1]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(kept, vec!["hooks", "rev", "repo"]);
        assert_eq!(dumped["repos"][0]["repo"], json!("local"));
    }

    #[test]
    fn test_local_repo_keeps_unknown_keys_when_a_hook_goes() {
        let reference = json!({
            "repos": [{
                "repo": "local",
                "hooks": [
                    {"id": "ruff", "fail_fast": true, "description": "mine", "name": "ruff"},
                    {"id": "ruff-format"},
                ],
            }]
        });
        let mut config: PreCommitConfig = validate(&reference).unwrap();
        config.repos[0].hooks.retain(|hook| hook.id != "ruff-format");
        let dumped = fancy_dump(&config, Some(&reference)).unwrap();
        assert_eq!(
            dumped["repos"][0]["hooks"],
            json!([{"id": "ruff", "fail_fast": true, "description": "mine", "name": "ruff"}])
        );
        let keys: Vec<_> = dumped["repos"][0]["hooks"][0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["id", "fail_fast", "description", "name"]);
    }
}
