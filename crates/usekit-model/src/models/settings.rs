//! `[tool.usekit]` settings table

use serde::{Deserialize, Serialize};

use crate::introspect::struct_fields;
use crate::ordering::{FieldOrder, Ordering};
use crate::projection::Model;

/// Per-project defaults for command options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UsekitSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen: Option<bool>,
    /// `uv`, `none` or `auto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

pub static SETTINGS_ORDER: Ordering = Ordering {
    model: "usekit settings",
    schema: struct_fields::<UsekitSettings>,
    fields: &[
        FieldOrder::plain("backend"),
        FieldOrder::plain("offline"),
        FieldOrder::plain("frozen"),
        FieldOrder::plain("quiet"),
    ],
};

impl Model for UsekitSettings {
    const NAME: &'static str = "usekit settings";

    fn ordering() -> &'static Ordering {
        &SETTINGS_ORDER
    }
}
