//! JSON tree

use std::path::Path;

use serde_json::{Map, Value};

use super::Tree;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::path::{self, KeyPath};

/// JSON document. Key order is kept; an untouched document is written back
/// byte for byte, an edited one is pretty-printed.
#[derive(Debug)]
pub struct JsonTree {
    source: String,
    original: Value,
    current: Value,
}

impl JsonTree {
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        let value = if source.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(source)
                .map_err(|e| Error::decode(Format::Json, path, e.to_string()))?
        };
        Ok(Self {
            source: source.to_string(),
            original: value.clone(),
            current: value,
        })
    }
}

impl Tree for JsonTree {
    fn format(&self) -> Format {
        Format::Json
    }

    fn to_value(&self) -> Value {
        self.current.clone()
    }

    fn get(&self, key_path: &KeyPath) -> Option<Value> {
        path::get_at_path(&self.current, key_path.segments()).cloned()
    }

    fn set(&mut self, key_path: &KeyPath, value: &Value) -> Result<()> {
        path::set_at_path(&mut self.current, key_path.segments(), value.clone())
            .map_err(|reason| Error::unsupported(Format::Json, key_path.to_string(), reason))
    }

    fn remove(&mut self, key_path: &KeyPath) -> Result<Option<Value>> {
        if key_path.is_empty() {
            return Err(Error::unsupported(
                Format::Json,
                key_path.to_string(),
                "cannot remove the document root",
            ));
        }
        Ok(path::remove_at_path(&mut self.current, key_path.segments()))
    }

    fn render(&self) -> Result<String> {
        if self.current == self.original {
            return Ok(self.source.clone());
        }
        let mut out = serde_json::to_string_pretty(&self.current)
            .map_err(|e| Error::unsupported(Format::Json, "<root>", e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}
