//! `.pre-commit-config.yaml` integration
//!
//! Hooks are added one repository entry at a time. Entries are kept in a
//! fixed hook order so the checks run cheapest-first, and the configuration
//! is rewritten through [`fancy_dump`] so unrelated entries keep their
//! layout and comments.

use serde_json::Value;
use usekit_content::{DocumentGuard, OpenMode};
use usekit_model::models::precommit::{HookDefinition, LOCAL_REPO, Repo};
use usekit_model::models::PreCommitConfig;
use usekit_model::{fancy_dump, validate};

use crate::error::Result;
use crate::project::Project;

pub const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

/// Id of the hook that keeps an otherwise empty configuration valid
pub const PLACEHOLDER_HOOK_ID: &str = "placeholder";

/// Order in which known hooks appear in `repos`
pub const HOOK_ORDER: &[&str] = &[
    "sync-with-uv",
    "validate-pyproject",
    "pyproject-fmt",
    "ruff",
    "ruff-format",
    "deptry",
    "codespell",
];

pub fn is_used(project: &Project) -> bool {
    project.has_file(PRE_COMMIT_CONFIG)
}

/// Local repository holding only the placeholder hook
pub fn placeholder_repo() -> Repo {
    Repo {
        repo: LOCAL_REPO.to_string(),
        rev: None,
        hooks: vec![HookDefinition::system(
            PLACEHOLDER_HOOK_ID,
            "Placeholder - add your own hooks!",
            "uv run --isolated --frozen --offline python -c \"print('hello world!')\"",
        )],
    }
}

fn is_placeholder(repo: &Repo) -> bool {
    repo.is_local() && repo.hook_ids().eq([PLACEHOLDER_HOOK_ID])
}

fn rank(repo: &Repo) -> usize {
    repo.hook_ids()
        .filter_map(|id| HOOK_ORDER.iter().position(|known| *known == id))
        .min()
        .unwrap_or(usize::MAX)
}

fn open(project: &Project) -> Result<DocumentGuard<'_>> {
    Ok(project
        .store()
        .open(project.path(PRE_COMMIT_CONFIG), OpenMode::CreateIfMissing)?)
}

fn load(doc: &DocumentGuard<'_>) -> Result<(Value, PreCommitConfig)> {
    let reference = doc.root()?;
    let config = validate::<PreCommitConfig>(&reference)?;
    Ok((reference, config))
}

fn save(doc: &DocumentGuard<'_>, config: &PreCommitConfig, reference: &Value) -> Result<()> {
    doc.set_root(fancy_dump(config, Some(reference))?)?;
    Ok(())
}

/// Ids of every configured hook, in file order.
pub fn hook_ids(project: &Project) -> Result<Vec<String>> {
    if !is_used(project) {
        return Ok(Vec::new());
    }
    let doc = open(project)?;
    let (_, config) = load(&doc)?;
    doc.close()?;
    Ok(config
        .repos
        .iter()
        .flat_map(Repo::hook_ids)
        .map(str::to_string)
        .collect())
}

/// Write a configuration holding only the placeholder hook when the file
/// does not exist yet.
pub fn ensure_config(project: &Project) -> Result<()> {
    if is_used(project) {
        return Ok(());
    }
    let doc = open(project)?;
    let (reference, mut config) = load(&doc)?;
    if config.repos.is_empty() {
        project.tick(&format!("Writing '{PRE_COMMIT_CONFIG}'."));
        config.repos.push(placeholder_repo());
        save(&doc, &config, &reference)?;
    }
    Ok(doc.close()?)
}

/// Add `repo` unless one of its hooks is already configured.
///
/// The file is created when missing, and the placeholder hook is dropped
/// once a real hook exists.
pub fn add_repo(project: &Project, repo: Repo) -> Result<()> {
    let doc = open(project)?;
    let (reference, mut config) = load(&doc)?;

    let ids: Vec<&str> = repo.hook_ids().collect();
    if config
        .repos
        .iter()
        .flat_map(Repo::hook_ids)
        .any(|existing| ids.contains(&existing))
    {
        tracing::debug!(hooks = ?ids, "hook already configured");
        return Ok(doc.close()?);
    }

    if !project.has_file(PRE_COMMIT_CONFIG) {
        project.tick(&format!("Writing '{PRE_COMMIT_CONFIG}'."));
    }
    for id in &ids {
        project.tick(&format!("Adding hook '{id}' to '{PRE_COMMIT_CONFIG}'."));
    }

    config.repos.retain(|existing| !is_placeholder(existing));
    let new_rank = rank(&repo);
    let position = config
        .repos
        .iter()
        .position(|existing| rank(existing) > new_rank && rank(existing) != usize::MAX)
        .unwrap_or(config.repos.len());
    tracing::info!(repo = %repo.repo, position, "adding pre-commit repository");
    config.repos.insert(position, repo);

    save(&doc, &config, &reference)?;
    Ok(doc.close()?)
}

/// Remove every hook with id `hook_id`.
///
/// Repositories left without hooks are dropped; other entries are kept as
/// they are. The file itself is never deleted: an emptied configuration gets
/// the placeholder hook.
pub fn remove_hook(project: &Project, hook_id: &str) -> Result<()> {
    if !is_used(project) {
        return Ok(());
    }
    let doc = open(project)?;
    let (reference, mut config) = load(&doc)?;

    let mut removed = false;
    config.repos.retain_mut(|repo| {
        let before = repo.hooks.len();
        repo.hooks.retain(|hook| hook.id != hook_id);
        if repo.hooks.len() == before {
            return true;
        }
        removed = true;
        !repo.hooks.is_empty()
    });
    if !removed {
        return Ok(doc.close()?);
    }

    project.tick(&format!("Removing hook '{hook_id}' from '{PRE_COMMIT_CONFIG}'."));
    if config.repos.is_empty() {
        config.repos.push(placeholder_repo());
    }
    tracing::info!(hook = hook_id, "removed pre-commit hook");

    save(&doc, &config, &reference)?;
    Ok(doc.close()?)
}

/// Delete `.pre-commit-config.yaml`.
pub fn remove_pre_commit_config(project: &Project) -> Result<()> {
    if project.store().remove_file(project.path(PRE_COMMIT_CONFIG))? {
        project.tick(&format!("Removing '{PRE_COMMIT_CONFIG}'."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Console, Options};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn local(id: &str) -> Repo {
        Repo {
            repo: LOCAL_REPO.to_string(),
            rev: None,
            hooks: vec![HookDefinition::system(id, id, &format!("uv run {id}"))],
        }
    }

    fn project() -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path(), Options::default(), Console::captured());
        (dir, project)
    }

    #[test]
    fn test_hooks_follow_canonical_order() {
        let (_dir, project) = project();
        add_repo(&project, local("codespell")).unwrap();
        add_repo(&project, local("ruff")).unwrap();
        add_repo(&project, local("deptry")).unwrap();
        assert_eq!(hook_ids(&project).unwrap(), vec!["ruff", "deptry", "codespell"]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let (dir, project) = project();
        add_repo(&project, local("deptry")).unwrap();
        let first = std::fs::read_to_string(dir.path().join(PRE_COMMIT_CONFIG)).unwrap();
        add_repo(&project, local("deptry")).unwrap();
        let second = std::fs::read_to_string(dir.path().join(PRE_COMMIT_CONFIG)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_hooks_stay_in_front() {
        let (dir, project) = project();
        std::fs::write(
            dir.path().join(PRE_COMMIT_CONFIG),
            "repos:\n  - repo: https://example.com/custom\n    rev: v1\n    hooks:\n      - id: custom\n",
        )
        .unwrap();
        add_repo(&project, local("ruff")).unwrap();
        assert_eq!(hook_ids(&project).unwrap(), vec!["custom", "ruff"]);
    }

    #[test]
    fn test_emptied_config_gets_placeholder() {
        let (dir, project) = project();
        add_repo(&project, local("deptry")).unwrap();
        remove_hook(&project, "deptry").unwrap();
        assert!(dir.path().join(PRE_COMMIT_CONFIG).exists());
        assert_eq!(hook_ids(&project).unwrap(), vec![PLACEHOLDER_HOOK_ID]);

        add_repo(&project, local("ruff")).unwrap();
        assert_eq!(hook_ids(&project).unwrap(), vec!["ruff"]);
    }

    #[test]
    fn test_ensure_config_writes_placeholder_once() {
        let (dir, project) = project();
        ensure_config(&project).unwrap();
        ensure_config(&project).unwrap();
        let content = std::fs::read_to_string(dir.path().join(PRE_COMMIT_CONFIG)).unwrap();
        assert!(content.contains("id: placeholder"), "{content}");
        assert_eq!(project.console().lines(), vec!["✔ Writing '.pre-commit-config.yaml'."]);
    }

    #[test]
    fn test_remove_absent_hook_is_silent() {
        let (_dir, project) = project();
        add_repo(&project, local("ruff")).unwrap();
        let lines = project.console().lines().len();
        remove_hook(&project, "deptry").unwrap();
        assert_eq!(project.console().lines().len(), lines);
        assert_eq!(hook_ids(&project).unwrap(), vec!["ruff"]);
    }

    #[test]
    fn test_add_keeps_comments_of_existing_repos() {
        let (dir, project) = project();
        let existing = "\
repos:
  # pinned for python 3.8 support
  - repo: https://example.com/custom
    rev: 'v1'  # do not bump
    hooks:
      - id: custom
";
        std::fs::write(dir.path().join(PRE_COMMIT_CONFIG), existing).unwrap();
        add_repo(&project, local("ruff")).unwrap();

        let content = std::fs::read_to_string(dir.path().join(PRE_COMMIT_CONFIG)).unwrap();
        assert!(content.starts_with(existing), "{content}");
        assert_eq!(hook_ids(&project).unwrap(), vec!["custom", "ruff"]);
    }

    #[test]
    fn test_remove_hook_keeps_siblings_as_written() {
        let (dir, project) = project();
        std::fs::write(
            dir.path().join(PRE_COMMIT_CONFIG),
            "repos:\n  - repo: local\n    hooks:\n      - id: ruff\n        fail_fast: true\n        description: mine\n        entry: uv run ruff check\n        language: system\n      - id: ruff-format\n        entry: uv run ruff format\n        language: system\n",
        )
        .unwrap();
        remove_hook(&project, "ruff-format").unwrap();

        let content = std::fs::read_to_string(dir.path().join(PRE_COMMIT_CONFIG)).unwrap();
        assert_eq!(
            content,
            "repos:\n  - repo: local\n    hooks:\n      - id: ruff\n        fail_fast: true\n        description: mine\n        entry: uv run ruff check\n        language: system\n"
        );
    }
}
