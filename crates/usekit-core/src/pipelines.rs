//! `bitbucket-pipelines.yml` integration

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::Value;
use usekit_content::{DocumentGuard, OpenMode};
use usekit_model::models::PipelinesConfiguration;
use usekit_model::models::pipelines::{Cache, Image, Parallel, Step, StepItem, StepWrapper};
use usekit_model::{fancy_dump, validate};

use crate::error::Result;
use crate::project::Project;

pub const BITBUCKET_PIPELINES: &str = "bitbucket-pipelines.yml";

pub const DEFAULT_IMAGE: &str = "atlassian/default-image:3";

/// Name of the step that keeps an otherwise empty pipeline valid
pub const PLACEHOLDER_STEP_NAME: &str = "Placeholder - add your own steps!";

pub fn is_used(project: &Project) -> bool {
    project.has_file(BITBUCKET_PIPELINES)
}

pub fn placeholder_step() -> Step {
    Step {
        name: Some(PLACEHOLDER_STEP_NAME.to_string()),
        script: vec!["echo 'Hello, world!'".into()],
        ..Step::default()
    }
}

fn is_placeholder(item: &StepItem) -> bool {
    matches!(item, StepItem::Step(wrapper) if wrapper.step.name.as_deref() == Some(PLACEHOLDER_STEP_NAME))
}

fn open(project: &Project) -> Result<DocumentGuard<'_>> {
    Ok(project
        .store()
        .open(project.path(BITBUCKET_PIPELINES), OpenMode::CreateIfMissing)?)
}

/// The current configuration, or the initial one for a new file.
fn load(project: &Project, doc: &DocumentGuard<'_>) -> Result<(Value, PipelinesConfiguration)> {
    let reference = doc.root()?;
    if !is_used(project) && reference.as_object().is_some_and(|map| map.is_empty()) {
        let mut config = PipelinesConfiguration {
            image: Some(Image::Name(DEFAULT_IMAGE.to_string())),
            ..PipelinesConfiguration::default()
        };
        config.pipelines.default = Some(vec![wrap(placeholder_step())]);
        return Ok((reference, config));
    }
    let config = validate::<PipelinesConfiguration>(&reference)?;
    Ok((reference, config))
}

fn save(doc: &DocumentGuard<'_>, config: &PipelinesConfiguration, reference: &Value) -> Result<()> {
    doc.set_root(fancy_dump(config, Some(reference))?)?;
    Ok(())
}

fn wrap(step: Step) -> StepItem {
    StepItem::Step(StepWrapper { step })
}

/// Every pipeline list in the configuration
fn all_pipelines(config: &PipelinesConfiguration) -> impl Iterator<Item = &Vec<StepItem>> {
    let named = [
        &config.pipelines.branches,
        &config.pipelines.pull_requests,
        &config.pipelines.tags,
        &config.pipelines.custom,
    ];
    config
        .pipelines
        .default
        .iter()
        .chain(named.into_iter().flatten().flat_map(|map| map.values()))
}

fn used_caches(config: &PipelinesConfiguration) -> HashSet<String> {
    all_pipelines(config)
        .flatten()
        .flat_map(StepItem::steps)
        .flat_map(|step| step.caches.iter().flatten().cloned())
        .collect()
}

/// Names of the steps in the default pipeline, in file order.
pub fn step_names(project: &Project) -> Result<Vec<String>> {
    if !is_used(project) {
        return Ok(Vec::new());
    }
    let doc = open(project)?;
    let (_, config) = load(project, &doc)?;
    doc.close()?;
    Ok(config
        .pipelines
        .default
        .iter()
        .flatten()
        .flat_map(StepItem::steps)
        .filter_map(|step| step.name.clone())
        .collect())
}

/// Write the initial configuration (image and placeholder step) when the
/// file does not exist yet.
pub fn ensure_config(project: &Project) -> Result<()> {
    if is_used(project) {
        return Ok(());
    }
    let doc = open(project)?;
    let (reference, config) = load(project, &doc)?;
    project.tick(&format!("Writing '{BITBUCKET_PIPELINES}'."));
    save(&doc, &config, &reference)?;
    Ok(doc.close()?)
}

/// Add `step` to the default pipeline along with the cache definitions it
/// uses.
///
/// A step with the same name already present leaves the file unchanged.
/// Creates the file when missing and drops the placeholder step.
pub fn add_step(project: &Project, step: Step, caches: &IndexMap<String, Cache>) -> Result<()> {
    let doc = open(project)?;
    let (reference, mut config) = load(project, &doc)?;
    let name = step.name.clone().unwrap_or_default();

    let default = config.pipelines.default.get_or_insert_with(Vec::new);
    if default
        .iter()
        .flat_map(StepItem::steps)
        .any(|existing| existing.name.as_deref() == Some(name.as_str()))
    {
        tracing::debug!(step = %name, "step already present");
        return Ok(doc.close()?);
    }

    if !is_used(project) {
        project.tick(&format!("Writing '{BITBUCKET_PIPELINES}'."));
    }
    project.tick(&format!("Adding '{name}' to default pipeline in '{BITBUCKET_PIPELINES}'."));

    default.retain(|item| !is_placeholder(item));
    default.push(wrap(step));

    if !caches.is_empty() {
        let definitions = config.definitions.get_or_insert_with(Default::default);
        let known = definitions.caches.get_or_insert_with(IndexMap::new);
        for (cache, definition) in caches {
            if !known.contains_key(cache) {
                tracing::debug!(cache = %cache, "adding cache definition");
                known.insert(cache.clone(), definition.clone());
            }
        }
    }

    tracing::info!(step = %name, "added pipeline step");
    save(&doc, &config, &reference)?;
    Ok(doc.close()?)
}

/// Remove the step named `name` from the default pipeline.
///
/// Cache definitions only that step used are dropped with it. When no step
/// is left the placeholder step is restored.
pub fn remove_step(project: &Project, name: &str) -> Result<()> {
    if !is_used(project) {
        return Ok(());
    }
    let doc = open(project)?;
    let (reference, mut config) = load(project, &doc)?;
    let Some(default) = config.pipelines.default.as_mut() else {
        return Ok(doc.close()?);
    };

    let mut removed: Vec<Step> = Vec::new();
    default.retain_mut(|item| {
        let taken = take_named(item, name);
        let keep = taken.is_empty() || (!item.steps().is_empty() && !matches!(item, StepItem::Step(_)));
        removed.extend(taken);
        keep
    });
    if removed.is_empty() {
        return Ok(doc.close()?);
    }
    project.tick(&format!("Removing '{name}' from default pipeline in '{BITBUCKET_PIPELINES}'."));
    if default.is_empty() {
        default.push(wrap(placeholder_step()));
    }

    let still_used = used_caches(&config);
    let orphaned: Vec<String> = removed
        .iter()
        .flat_map(|step| step.caches.iter().flatten().cloned())
        .filter(|cache| !still_used.contains(cache))
        .collect();
    let mut pruned = false;
    if let Some(known) = config.definitions.as_mut().and_then(|d| d.caches.as_mut()) {
        for cache in &orphaned {
            if known.shift_remove(cache).is_some() {
                tracing::debug!(cache = %cache, "dropping unused cache definition");
                pruned = true;
            }
        }
    }
    if pruned {
        prune_empty_definitions(&mut config);
    }

    tracing::info!(step = name, "removed pipeline step");
    save(&doc, &config, &reference)?;
    Ok(doc.close()?)
}

fn prune_empty_definitions(config: &mut PipelinesConfiguration) {
    let Some(definitions) = config.definitions.as_mut() else {
        return;
    };
    if definitions.caches.as_ref().is_some_and(IndexMap::is_empty) {
        definitions.caches = None;
    }
    if definitions.caches.is_none() && definitions.services.is_none() && definitions.scripts.is_none() {
        config.definitions = None;
    }
}

/// Take the steps named `name` out of `item`; a plain step is returned
/// whole, groups lose only the matching members.
fn take_named(item: &mut StepItem, name: &str) -> Vec<Step> {
    let is_named = |wrapper: &StepWrapper| wrapper.step.name.as_deref() == Some(name);
    let split = |wrappers: &mut Vec<StepWrapper>| -> Vec<Step> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(wrappers).into_iter().partition(is_named);
        *wrappers = kept;
        taken.into_iter().map(|wrapper| wrapper.step).collect()
    };
    match item {
        StepItem::Step(wrapper) if is_named(&*wrapper) => vec![wrapper.step.clone()],
        StepItem::Step(_) => Vec::new(),
        StepItem::Parallel(wrapper) => match &mut wrapper.parallel {
            Parallel::Steps(steps) => split(steps),
            Parallel::Expanded(expanded) => split(&mut expanded.steps),
        },
        StepItem::Stage(wrapper) => split(&mut wrapper.stage.steps),
    }
}

/// Delete `bitbucket-pipelines.yml`.
pub fn remove_pipelines(project: &Project) -> Result<()> {
    if project.store().remove_file(project.path(BITBUCKET_PIPELINES))? {
        project.tick(&format!("Removing '{BITBUCKET_PIPELINES}' file."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Console, Options};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use usekit_model::models::pipelines::{CacheDetails, CacheKey};

    fn project() -> (TempDir, Project) {
        let dir = TempDir::new().unwrap();
        let project = Project::new(dir.path(), Options::default(), Console::captured());
        (dir, project)
    }

    fn step(name: &str, caches: &[&str]) -> Step {
        Step {
            name: Some(name.to_string()),
            caches: (!caches.is_empty()).then(|| caches.iter().map(|c| c.to_string()).collect()),
            script: vec![format!("uv run {name}").as_str().into()],
            ..Step::default()
        }
    }

    fn uv_cache() -> IndexMap<String, Cache> {
        IndexMap::from([(
            "uv".to_string(),
            Cache::Detailed(CacheDetails {
                path: "~/.cache/uv".to_string(),
                key: Some(CacheKey {
                    files: vec!["uv.lock".to_string()],
                }),
            }),
        )])
    }

    #[test]
    fn test_new_file_has_image_and_placeholder() {
        let (dir, project) = project();
        add_step(&project, step("Run Ruff", &[]), &IndexMap::new()).unwrap();
        let content = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        assert!(content.starts_with("image: atlassian/default-image:3\n"), "{content}");
        assert!(!content.contains(PLACEHOLDER_STEP_NAME));
        assert_eq!(step_names(&project).unwrap(), vec!["Run Ruff"]);
    }

    #[test]
    fn test_add_step_is_idempotent() {
        let (dir, project) = project();
        add_step(&project, step("Run Ruff", &["uv"]), &uv_cache()).unwrap();
        let first = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        add_step(&project, step("Run Ruff", &["uv"]), &uv_cache()).unwrap();
        let second = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unused_cache_is_dropped_with_last_step() {
        let (dir, project) = project();
        add_step(&project, step("Run Ruff", &["uv"]), &uv_cache()).unwrap();
        add_step(&project, step("Run deptry", &["uv"]), &uv_cache()).unwrap();

        remove_step(&project, "Run Ruff").unwrap();
        let content = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        assert!(content.contains("caches:"), "{content}");

        remove_step(&project, "Run deptry").unwrap();
        let content = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        assert!(!content.contains("definitions:"), "{content}");
        assert_eq!(step_names(&project).unwrap(), vec![PLACEHOLDER_STEP_NAME]);
    }

    #[test]
    fn test_remove_step_inside_parallel_group() {
        let (dir, project) = project();
        std::fs::write(
            dir.path().join(BITBUCKET_PIPELINES),
            "image: python:3.12\npipelines:\n  default:\n    - parallel:\n        - step:\n            name: a\n            script:\n              - echo a\n        - step:\n            name: b\n            script:\n              - echo b\n",
        )
        .unwrap();
        remove_step(&project, "a").unwrap();
        assert_eq!(step_names(&project).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_ensure_config_writes_placeholder() {
        let (_dir, project) = project();
        ensure_config(&project).unwrap();
        assert_eq!(step_names(&project).unwrap(), vec![PLACEHOLDER_STEP_NAME]);
        ensure_config(&project).unwrap();
        assert_eq!(project.console().lines().len(), 1);
    }

    #[test]
    fn test_remove_pipelines() {
        let (dir, project) = project();
        add_step(&project, step("Run Ruff", &[]), &IndexMap::new()).unwrap();
        remove_pipelines(&project).unwrap();
        assert!(!dir.path().join(BITBUCKET_PIPELINES).exists());
        assert!(step_names(&project).unwrap().is_empty());
    }

    #[test]
    fn test_add_step_keeps_anchors_and_comments_of_other_steps() {
        let (dir, project) = project();
        let existing = "\
image: python:3.12
definitions:
  scripts:
    setup:
      - &install-uv curl -LsSf https://astral.sh/uv/install.sh | sh
pipelines:
  default:
    - step:
        name: Mine  # keep
        script:
          - *install-uv
          - uv run pytest
";
        std::fs::write(dir.path().join(BITBUCKET_PIPELINES), existing).unwrap();
        add_step(&project, step("Run Ruff", &["uv"]), &uv_cache()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(BITBUCKET_PIPELINES)).unwrap();
        assert!(content.contains("      - &install-uv curl"), "{content}");
        assert!(content.contains("        name: Mine  # keep\n        script:\n          - *install-uv\n"), "{content}");
        assert!(content.contains("  caches:\n    uv:\n"), "{content}");
        assert_eq!(step_names(&project).unwrap(), vec!["Mine", "Run Ruff"]);
    }
}
