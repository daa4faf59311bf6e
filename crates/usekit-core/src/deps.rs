//! Dependency declarations and the backends that record them

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use usekit_content::KeyPath;

use crate::error::Result;
use crate::options::BackendKind;
use crate::project::Project;
use crate::pyproject::{self, PYPROJECT_TOML};
use crate::subprocess;

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?")
        .expect("requirement regex is valid")
});

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator regex is valid"));

/// The group development tools are installed into
pub const DEV_GROUP: &str = "dev";

/// A package requirement without a version constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub name: String,
    pub extras: Vec<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
        }
    }

    pub fn with_extras<I, S>(name: impl Into<String>, extras: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            extras: extras.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the name and extras of a requirement string such as
    /// `coverage[toml]>=7`. Version specifiers and markers are ignored.
    pub fn parse(requirement: &str) -> Option<Self> {
        let captures = REQUIREMENT.captures(requirement)?;
        let extras = captures
            .get(2)
            .map(|extras| {
                extras
                    .as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|extra| !extra.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            name: captures[1].to_string(),
            extras,
        })
    }

    /// PEP 503 normalized name
    pub fn normalized_name(&self) -> String {
        normalize(&self.name)
    }

    /// Requirement string passed to the backend, e.g. `coverage[toml]`
    pub fn to_requirement(&self) -> String {
        if self.extras.is_empty() {
            self.name.clone()
        } else {
            format!("{}[{}]", self.name, self.extras.join(","))
        }
    }

    /// Whether `declared` names this package with at least these extras
    fn is_satisfied_by(&self, declared: &Dependency) -> bool {
        declared.normalized_name() == self.normalized_name()
            && self
                .extras
                .iter()
                .all(|extra| declared.extras.iter().any(|d| normalize(d) == normalize(extra)))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_requirement())
    }
}

fn normalize(name: &str) -> String {
    SEPARATORS.replace_all(name, "-").to_lowercase()
}

fn group_path(group: &str) -> KeyPath {
    KeyPath::new(["dependency-groups", group])
}

/// Places in `pyproject.toml` where a group's requirements may be declared,
/// `[dependency-groups]` first
fn declaration_paths(group: &str) -> Vec<KeyPath> {
    let mut paths = vec![group_path(group)];
    if group == DEV_GROUP {
        paths.push(KeyPath::new(["tool", "uv", "dev-dependencies"]));
    }
    paths.push(KeyPath::new(["project", "optional-dependencies", group]));
    paths
}

fn requirement_strings(value: &Value) -> impl Iterator<Item = &str> {
    value.as_array().into_iter().flatten().filter_map(Value::as_str)
}

/// Whether `dependency` is declared in `group`.
pub fn is_declared(project: &Project, dependency: &Dependency, group: &str) -> Result<bool> {
    declared_in(project, dependency, &declaration_paths(group))
}

fn declared_in(project: &Project, dependency: &Dependency, paths: &[KeyPath]) -> Result<bool> {
    if !project.has_file(PYPROJECT_TOML) {
        return Ok(false);
    }
    let doc = pyproject::open(project)?;
    let mut declared = false;
    for path in paths {
        let Ok(value) = doc.get(path) else {
            continue;
        };
        if requirement_strings(&value)
            .filter_map(Dependency::parse)
            .any(|found| dependency.is_satisfied_by(&found))
        {
            declared = true;
            break;
        }
    }
    doc.close()?;
    Ok(declared)
}

/// Drop the requirements naming any of `dependencies` from the lists at
/// `paths`. Emptied lists are kept.
fn remove_declarations(project: &Project, dependencies: &[Dependency], paths: &[KeyPath]) -> Result<()> {
    let doc = pyproject::open(project)?;
    for path in paths {
        let Ok(list) = doc.get(path) else {
            continue;
        };
        let matching: Vec<Value> = requirement_strings(&list)
            .filter(|entry| {
                Dependency::parse(entry).is_some_and(|found| {
                    dependencies
                        .iter()
                        .any(|dep| dep.normalized_name() == found.normalized_name())
                })
            })
            .map(|entry| Value::String(entry.to_string()))
            .collect();
        if !matching.is_empty() {
            tracing::debug!(path = %path, count = matching.len(), "removing requirements");
            doc.remove_from_list(path, &matching)?;
        }
    }
    doc.close()?;
    Ok(())
}

// ============================================================================
// Backends
// ============================================================================

/// Records dependency declarations for a project.
pub trait DependencyBackend {
    fn name(&self) -> &'static str;

    fn add(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()>;

    fn remove(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()>;
}

/// Delegates to `uv add` / `uv remove`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UvBackend;

impl UvBackend {
    fn run(&self, project: &Project, verb: &str, group: &str, requirements: Vec<String>) -> Result<()> {
        let options = project.options();
        let mut args = vec![verb.to_string(), "--group".to_string(), group.to_string()];
        if options.offline {
            args.push("--offline".to_string());
        }
        if options.frozen {
            args.push("--frozen".to_string());
        }
        if options.quiet {
            args.push("--quiet".to_string());
        }
        args.extend(requirements);

        // uv edits pyproject.toml itself; pending edits go to disk first and
        // the shared copy is re-read afterwards.
        let manifest = project.path(PYPROJECT_TOML);
        project.store().flush(&manifest)?;
        subprocess::run("uv", &args, project.root())?;
        project.store().reload(&manifest)?;
        Ok(())
    }
}

impl DependencyBackend for UvBackend {
    fn name(&self) -> &'static str {
        "uv"
    }

    fn add(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
        let requirements = dependencies.iter().map(Dependency::to_requirement).collect();
        self.run(project, "add", group, requirements)
    }

    fn remove(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
        let names = dependencies.iter().map(|dep| dep.name.clone()).collect();
        self.run(project, "remove", group, names)
    }
}

/// Edits `[dependency-groups]` in `pyproject.toml` directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestBackend;

impl DependencyBackend for ManifestBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn add(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
        let values: Vec<Value> = dependencies
            .iter()
            .map(|dep| Value::String(dep.to_requirement()))
            .collect();
        let doc = pyproject::open(project)?;
        doc.extend_list(&group_path(group), &values)?;
        doc.close()?;
        Ok(())
    }

    fn remove(&self, project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
        remove_declarations(project, dependencies, &[group_path(group)])
    }
}

/// The backend selected by the project's options.
pub fn backend(project: &Project) -> Box<dyn DependencyBackend> {
    let kind = match project.options().backend {
        BackendKind::Auto if project.has_file("uv.lock") || subprocess::is_available("uv") => BackendKind::Uv,
        BackendKind::Auto => BackendKind::Disabled,
        kind => kind,
    };
    tracing::debug!(backend = %kind, "resolved dependency backend");
    match kind {
        BackendKind::Uv => Box::new(UvBackend),
        _ => Box::new(ManifestBackend),
    }
}

/// Declare every dependency of `dependencies` missing from `group`.
pub fn add_dependencies(project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
    let mut missing = Vec::new();
    for dependency in dependencies {
        if !is_declared(project, dependency, group)? {
            missing.push(dependency.clone());
        }
    }
    if missing.is_empty() {
        return Ok(());
    }
    for dependency in &missing {
        project.tick(&format!(
            "Adding dependency '{dependency}' to the '{group}' group in '{PYPROJECT_TOML}'."
        ));
    }
    backend(project).add(project, &missing, group)
}

/// Remove every dependency of `dependencies` declared in `group`.
pub fn remove_dependencies(project: &Project, dependencies: &[Dependency], group: &str) -> Result<()> {
    let mut declared = Vec::new();
    for dependency in dependencies {
        let bare = Dependency::new(dependency.name.clone());
        if is_declared(project, &bare, group)? {
            declared.push(dependency.clone());
        }
    }
    if declared.is_empty() {
        return Ok(());
    }
    let mut grouped = Vec::new();
    for dependency in &declared {
        project.tick(&format!(
            "Removing dependency '{}' from the '{group}' group in '{PYPROJECT_TOML}'.",
            dependency.name
        ));
        let bare = Dependency::new(dependency.name.clone());
        if declared_in(project, &bare, &[group_path(group)])? {
            grouped.push(dependency.clone());
        }
    }
    if !grouped.is_empty() {
        backend(project).remove(project, &grouped, group)?;
    }
    // Legacy `tool.uv.dev-dependencies` and optional extras are edited in place
    // whichever backend is in use.
    remove_declarations(project, &declared, &declaration_paths(group)[1..])
}
