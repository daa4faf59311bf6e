//! `bitbucket-pipelines.yml` schema
//!
//! Only the parts of the Bitbucket schema that usekit reads or writes are
//! modelled; any other key survives a rewrite because the dump carries keys
//! the models do not know.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::introspect::struct_fields;
use crate::ordering::{FieldOrder, Ordering, Shape};
use crate::projection::Model;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelinesConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone: Option<CloneSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<GlobalOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    #[serde(default)]
    pub pipelines: Pipelines,
}

/// Build image: a bare name or a mapping with credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Image {
    Name(String),
    Detailed(ImageDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageDetails {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CloneSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<CloneDepth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_ssl_verify: Option<bool>,
}

/// `depth: full` or a commit count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CloneDepth {
    Count(u64),
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caches: Option<IndexMap<String, Cache>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<IndexMap<String, Value>>,
    /// Shared script fragments, usually anchored and aliased from steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<IndexMap<String, Vec<ScriptItem>>>,
}

/// A cache definition: a bare path or a path keyed on lock files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cache {
    Path(String),
    Detailed(CacheDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheDetails {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<CacheKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheKey {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pipelines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<StepItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<IndexMap<String, Vec<StepItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_requests: Option<IndexMap<String, Vec<StepItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexMap<String, Vec<StepItem>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<IndexMap<String, Vec<StepItem>>>,
}

/// An entry of a pipeline. Tried as a step, then a parallel group, then a
/// stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepItem {
    Step(StepWrapper),
    Parallel(ParallelWrapper),
    Stage(StageWrapper),
}

impl StepItem {
    /// Every step in this item, descending into parallel groups and stages
    pub fn steps(&self) -> Vec<&Step> {
        match self {
            Self::Step(wrapper) => vec![&wrapper.step],
            Self::Parallel(wrapper) => wrapper.parallel.steps().iter().map(|w| &w.step).collect(),
            Self::Stage(wrapper) => wrapper.stage.steps.iter().map(|w| &w.step).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepWrapper {
    pub step: Step,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelWrapper {
    pub parallel: Parallel,
}

/// A parallel group: a list of steps, or the expanded form with options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parallel {
    Steps(Vec<StepWrapper>),
    Expanded(ParallelExpanded),
}

impl Parallel {
    pub fn steps(&self) -> &[StepWrapper] {
        match self {
            Self::Steps(steps) => steps,
            Self::Expanded(expanded) => &expanded.steps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParallelExpanded {
    pub steps: Vec<StepWrapper>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageWrapper {
    pub stage: Stage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    pub steps: Vec<StepWrapper>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caches: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs_on: Option<RunsOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone: Option<CloneSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,
    pub script: Vec<ScriptItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_script: Option<Vec<ScriptItem>>,
}

/// Runner labels. A list is tried first so a single label stays a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Labels(Vec<String>),
    Single(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Artifacts {
    Paths(Vec<String>),
    Detailed(ArtifactsDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
}

/// A script line: a shell command or a pipe invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptItem {
    Command(String),
    Pipe(Pipe),
}

impl From<&str> for ScriptItem {
    fn from(command: &str) -> Self {
        Self::Command(command.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub pipe: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, Value>>,
}

// ===========================================================================
// Canonical order
// ===========================================================================

/// Steps are paired by name; unnamed steps fall back to their script.
fn step_item_identity(value: &Value) -> Vec<String> {
    let Some(step) = value.get("step") else {
        return Vec::new();
    };
    let key = match step.get("name").and_then(Value::as_str) {
        Some(name) => Some(format!("step:{name}")),
        None => step.get("script").map(|script| format!("script:{script}")),
    };
    key.into_iter().collect()
}

static IMAGE_SHAPE: Shape = Shape::Model(&IMAGE_ORDER);
static CLONE_SHAPE: Shape = Shape::Model(&CLONE_ORDER);
static CACHE_SHAPE: Shape = Shape::Model(&CACHE_ORDER);
static CACHES: Shape = Shape::MapOf(&CACHE_SHAPE);
static DEFINITIONS_SHAPE: Shape = Shape::Model(&DEFINITIONS_ORDER);
static PIPELINES_SHAPE: Shape = Shape::Model(&PIPELINES_ORDER);
static STEP_ITEM_VARIANTS: [&Ordering; 3] = [&STEP_WRAPPER_ORDER, &PARALLEL_WRAPPER_ORDER, &STAGE_WRAPPER_ORDER];
static STEP_ITEM: Shape = Shape::OneOf(&STEP_ITEM_VARIANTS);
static STEP_ITEMS: Shape = Shape::SeqOf(&STEP_ITEM, Some(step_item_identity));
static NAMED_STEP_ITEMS: Shape = Shape::MapOf(&STEP_ITEMS);
static STEP_SHAPE: Shape = Shape::Model(&STEP_ORDER);
static STAGE_SHAPE: Shape = Shape::Model(&STAGE_ORDER);
static STEP_WRAPPER_SHAPE: Shape = Shape::Model(&STEP_WRAPPER_ORDER);
static STAGE_STEPS: Shape = Shape::SeqOf(&STEP_WRAPPER_SHAPE, Some(step_item_identity));

pub static IMAGE_ORDER: Ordering = Ordering {
    model: "image",
    schema: struct_fields::<ImageDetails>,
    fields: &[
        FieldOrder::plain("name"),
        FieldOrder::plain("username"),
        FieldOrder::plain("password"),
        FieldOrder::plain("email"),
        FieldOrder::plain("run-as-user"),
    ],
};

pub static CLONE_ORDER: Ordering = Ordering {
    model: "clone",
    schema: struct_fields::<CloneSettings>,
    fields: &[
        FieldOrder::plain("enabled"),
        FieldOrder::plain("depth"),
        FieldOrder::plain("lfs"),
        FieldOrder::plain("skip-ssl-verify"),
    ],
};

pub static CACHE_ORDER: Ordering = Ordering {
    model: "cache",
    schema: struct_fields::<CacheDetails>,
    fields: &[FieldOrder::plain("key"), FieldOrder::plain("path")],
};

pub static DEFINITIONS_ORDER: Ordering = Ordering {
    model: "definitions",
    schema: struct_fields::<Definitions>,
    fields: &[
        FieldOrder::plain("scripts"),
        FieldOrder::new("caches", &CACHES),
        FieldOrder::plain("services"),
    ],
};

pub static STEP_ORDER: Ordering = Ordering {
    model: "step",
    schema: struct_fields::<Step>,
    fields: &[
        FieldOrder::plain("name"),
        FieldOrder::new("image", &IMAGE_SHAPE),
        FieldOrder::plain("size"),
        FieldOrder::plain("runs-on"),
        FieldOrder::plain("max-time"),
        FieldOrder::new("clone", &CLONE_SHAPE),
        FieldOrder::plain("oidc"),
        FieldOrder::plain("deployment"),
        FieldOrder::plain("trigger"),
        FieldOrder::plain("condition"),
        FieldOrder::plain("fail-fast"),
        FieldOrder::plain("caches"),
        FieldOrder::plain("services"),
        FieldOrder::plain("artifacts"),
        FieldOrder::plain("script"),
        FieldOrder::plain("after-script"),
    ],
};

pub static STEP_WRAPPER_ORDER: Ordering = Ordering {
    model: "step entry",
    schema: struct_fields::<StepWrapper>,
    fields: &[FieldOrder::new("step", &STEP_SHAPE)],
};

pub static PARALLEL_WRAPPER_ORDER: Ordering = Ordering {
    model: "parallel entry",
    schema: struct_fields::<ParallelWrapper>,
    fields: &[FieldOrder::plain("parallel")],
};

pub static STAGE_ORDER: Ordering = Ordering {
    model: "stage",
    schema: struct_fields::<Stage>,
    fields: &[
        FieldOrder::plain("name"),
        FieldOrder::plain("deployment"),
        FieldOrder::plain("trigger"),
        FieldOrder::plain("condition"),
        FieldOrder::new("steps", &STAGE_STEPS),
    ],
};

pub static STAGE_WRAPPER_ORDER: Ordering = Ordering {
    model: "stage entry",
    schema: struct_fields::<StageWrapper>,
    fields: &[FieldOrder::new("stage", &STAGE_SHAPE)],
};

pub static PIPELINES_ORDER: Ordering = Ordering {
    model: "pipelines",
    schema: struct_fields::<Pipelines>,
    fields: &[
        FieldOrder::new("default", &STEP_ITEMS),
        FieldOrder::new("branches", &NAMED_STEP_ITEMS),
        FieldOrder::new("pull-requests", &NAMED_STEP_ITEMS),
        FieldOrder::new("tags", &NAMED_STEP_ITEMS),
        FieldOrder::new("custom", &NAMED_STEP_ITEMS),
    ],
};

pub static CONFIGURATION_ORDER: Ordering = Ordering {
    model: "Bitbucket Pipelines configuration",
    schema: struct_fields::<PipelinesConfiguration>,
    fields: &[
        FieldOrder::new("image", &IMAGE_SHAPE),
        FieldOrder::new("clone", &CLONE_SHAPE),
        FieldOrder::plain("options"),
        FieldOrder::new("definitions", &DEFINITIONS_SHAPE),
        FieldOrder::new("pipelines", &PIPELINES_SHAPE),
    ],
};

impl Model for PipelinesConfiguration {
    const NAME: &'static str = "Bitbucket Pipelines configuration";

    fn ordering() -> &'static Ordering {
        &CONFIGURATION_ORDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fancy_dump, validate};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_single_runner_label_is_not_a_list() {
        let step: Step = serde_json::from_value(json!({"script": [], "runs-on": "linux"})).unwrap();
        assert_eq!(step.runs_on, Some(RunsOn::Single("linux".to_string())));
        let step: Step =
            serde_json::from_value(json!({"script": [], "runs-on": ["self.hosted", "linux"]}))
                .unwrap();
        assert!(matches!(step.runs_on, Some(RunsOn::Labels(labels)) if labels.len() == 2));
    }

    #[test]
    fn test_script_items_accept_commands_and_pipes() {
        let items: Vec<ScriptItem> = serde_json::from_value(json!([
            "echo hi",
            {"pipe": "atlassian/demo:1.0", "variables": {"A": "1"}}
        ]))
        .unwrap();
        assert_eq!(items[0], ScriptItem::from("echo hi"));
        assert!(matches!(&items[1], ScriptItem::Pipe(pipe) if pipe.pipe == "atlassian/demo:1.0"));
    }

    #[test]
    fn test_steps_collects_nested_steps() {
        let config: PipelinesConfiguration = validate(&json!({
            "pipelines": {"default": [
                {"parallel": {"fail-fast": true, "steps": [
                    {"step": {"name": "A", "script": ["a"]}},
                    {"step": {"name": "B", "script": ["b"]}}
                ]}},
                {"stage": {"name": "S", "steps": [{"step": {"name": "C", "script": ["c"]}}]}}
            ]}
        }))
        .unwrap();
        let names: Vec<_> = config
            .pipelines
            .default
            .unwrap()
            .iter()
            .flat_map(|item| item.steps().into_iter().filter_map(|s| s.name.clone()).collect::<Vec<_>>())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rewrite_keeps_step_layout_and_unknown_keys() {
        let reference = json!({
            "image": "python:3.12",
            "pipelines": {
                "default": [
                    {"step": {"script": ["uv run pytest"], "name": "Test", "x-owner": "qa"}}
                ]
            }
        });
        let mut config: PipelinesConfiguration = validate(&reference).unwrap();
        let default = config.pipelines.default.get_or_insert_with(Vec::new);
        default.insert(
            0,
            StepItem::Step(StepWrapper {
                step: Step {
                    name: Some("Lint".to_string()),
                    caches: Some(vec!["uv".to_string()]),
                    script: vec![ScriptItem::from("uv run ruff check")],
                    ..Step::default()
                },
            }),
        );
        let dumped = fancy_dump(&config, Some(&reference)).unwrap();
        let steps = &dumped["pipelines"]["default"];
        assert_eq!(keys(&steps[0]["step"]), vec!["name", "caches", "script"]);
        assert_eq!(keys(&steps[1]["step"]), vec!["script", "name", "x-owner"]);
    }
}
