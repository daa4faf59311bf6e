//! `[project]` table of `pyproject.toml`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::introspect::struct_fields;
use crate::ordering::{FieldOrder, Ordering};
use crate::projection::Model;

/// The PEP 621 project table. Only `name` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_python: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_dependencies: Option<IndexMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<Vec<String>>,
}

pub static PROJECT_ORDER: Ordering = Ordering {
    model: "project section",
    schema: struct_fields::<ProjectSection>,
    fields: &[
        FieldOrder::plain("name"),
        FieldOrder::plain("version"),
        FieldOrder::plain("description"),
        FieldOrder::plain("readme"),
        FieldOrder::plain("requires-python"),
        FieldOrder::plain("license"),
        FieldOrder::plain("authors"),
        FieldOrder::plain("classifiers"),
        FieldOrder::plain("dependencies"),
        FieldOrder::plain("optional-dependencies"),
        FieldOrder::plain("scripts"),
        FieldOrder::plain("dynamic"),
    ],
};

impl Model for ProjectSection {
    const NAME: &'static str = "project section";

    fn ordering() -> &'static Ordering {
        &PROJECT_ORDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, validate};
    use serde_json::json;

    #[test]
    fn test_name_is_required() {
        let err = validate::<ProjectSection>(&json!({"version": "1.0"})).unwrap_err();
        assert!(matches!(err, Error::Structure { model: "project section", .. }));
    }

    #[test]
    fn test_kebab_case_fields() {
        let project: ProjectSection =
            validate(&json!({"name": "demo", "requires-python": ">=3.10"})).unwrap();
        assert_eq!(project.requires_python.as_deref(), Some(">=3.10"));
    }
}
