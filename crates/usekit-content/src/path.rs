//! Key paths and traversal over plain value trees
//!
//! A [`KeyPath`] addresses a location in a tree of mappings and sequences.
//! Mapping keys are names; sequence positions are indices.
//!
//! # Path Syntax
//!
//! - Dot-separated keys: `tool.ruff.lint`
//! - Quoted keys for names containing dots: `tool."ruff.lint"`
//! - Sequence indexing: `repos[0].hooks`
//!
//! ```
//! use usekit_content::path::{Key, KeyPath};
//!
//! let path = KeyPath::parse("repos[0].hooks");
//! assert_eq!(path.segments(), &[
//!     Key::Name("repos".to_string()),
//!     Key::Index(0),
//!     Key::Name("hooks".to_string()),
//! ]);
//! ```

use serde_json::Value;
use std::fmt;

/// A segment of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A key in a mapping
    Name(String),
    /// A position in a sequence
    Index(usize),
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => {
                let bare = !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if bare {
                    f.write_str(name)
                } else {
                    write!(f, "\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
                }
            }
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// An ordered sequence of keys identifying a location in a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Key>,
}

impl KeyPath {
    /// Build a path from any sequence of segments.
    pub fn new<I, K>(segments: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path string.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current.is_empty() {
                        segments.push(Key::Name(std::mem::take(&mut current)));
                    }
                }
                '"' | '\'' => {
                    let quote = ch;
                    let mut escaped = false;
                    for ch in chars.by_ref() {
                        if escaped {
                            current.push(ch);
                            escaped = false;
                        } else if ch == '\\' {
                            escaped = true;
                        } else if ch == quote {
                            break;
                        } else {
                            current.push(ch);
                        }
                    }
                    segments.push(Key::Name(std::mem::take(&mut current)));
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Key::Name(std::mem::take(&mut current)));
                    }
                    let mut index = String::new();
                    for ch in chars.by_ref() {
                        if ch == ']' {
                            break;
                        }
                        index.push(ch);
                    }
                    match index.trim().parse::<usize>() {
                        Ok(idx) => segments.push(Key::Index(idx)),
                        Err(_) if !index.trim().is_empty() => {
                            segments.push(Key::Name(index.trim().to_string()))
                        }
                        Err(_) => {}
                    }
                }
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            segments.push(Key::Name(current));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Key] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A new path with `key` appended.
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// A new path with all of `other`'s segments appended.
    pub fn join(&self, other: &KeyPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Split into the parent path and the final segment.
    pub fn split_last(&self) -> Option<(KeyPath, &Key)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            KeyPath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, key) in self.segments.iter().enumerate() {
            if i > 0 && matches!(key, Key::Name(_)) {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

/// Get a value at the given path from a plain value tree.
///
/// Returns `None` if any segment does not resolve.
pub fn get_at_path<'a>(value: &'a Value, segments: &[Key]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match segment {
            Key::Name(key) => current.as_object()?.get(key)?,
            Key::Index(idx) => current.as_array()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Mutable variant of [`get_at_path`].
pub fn get_at_path_mut<'a>(value: &'a mut Value, segments: &[Key]) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in segments {
        current = match segment {
            Key::Name(key) => current.as_object_mut()?.get_mut(key)?,
            Key::Index(idx) => current.as_array_mut()?.get_mut(*idx)?,
        };
    }
    Some(current)
}

/// Set a value at the given path, creating intermediate mappings.
///
/// Indices must already exist. Returns a description of the obstacle when
/// the path runs through a scalar or a missing index.
pub fn set_at_path(
    value: &mut Value,
    segments: &[Key],
    new_value: Value,
) -> std::result::Result<(), String> {
    let Some((last, parents)) = segments.split_last() else {
        *value = new_value;
        return Ok(());
    };

    let mut current = value;
    for segment in parents {
        current = match segment {
            Key::Name(key) => {
                if current.is_null() {
                    *current = Value::Object(serde_json::Map::new());
                }
                let map = current
                    .as_object_mut()
                    .ok_or_else(|| format!("'{key}' is not inside a mapping"))?;
                map.entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()))
            }
            Key::Index(idx) => current
                .as_array_mut()
                .and_then(|arr| arr.get_mut(*idx))
                .ok_or_else(|| format!("index {idx} does not exist"))?,
        };
    }

    match last {
        Key::Name(key) => {
            if current.is_null() {
                *current = Value::Object(serde_json::Map::new());
            }
            let map = current
                .as_object_mut()
                .ok_or_else(|| format!("'{key}' is not inside a mapping"))?;
            map.insert(key.clone(), new_value);
            Ok(())
        }
        Key::Index(idx) => {
            let slot = current
                .as_array_mut()
                .and_then(|arr| arr.get_mut(*idx))
                .ok_or_else(|| format!("index {idx} does not exist"))?;
            *slot = new_value;
            Ok(())
        }
    }
}

/// Remove a value at the given path.
///
/// Returns the removed value if the path existed. Mapping order of the
/// remaining keys is preserved.
pub fn remove_at_path(value: &mut Value, segments: &[Key]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let parent = get_at_path_mut(value, parents)?;
    match last {
        Key::Name(key) => parent.as_object_mut()?.shift_remove(key),
        Key::Index(idx) => {
            let arr = parent.as_array_mut()?;
            if *idx < arr.len() {
                Some(arr.remove(*idx))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_dotted() {
        let path = KeyPath::parse("tool.ruff.lint");
        assert_eq!(path, KeyPath::new(["tool", "ruff", "lint"]));
    }

    #[test]
    fn test_parse_path_quoted() {
        let path = KeyPath::parse(r#"tool."ruff.lint".select"#);
        assert_eq!(path, KeyPath::new(["tool", "ruff.lint", "select"]));
    }

    #[test]
    fn test_parse_path_index() {
        let path = KeyPath::parse("repos[1].hooks[0].id");
        assert_eq!(
            path.segments(),
            &[
                Key::from("repos"),
                Key::Index(1),
                Key::from("hooks"),
                Key::Index(0),
                Key::from("id"),
            ]
        );
    }

    #[test]
    fn test_display_round_trips() {
        let path = KeyPath::new([Key::from("tool"), Key::from("a.b"), Key::Index(2)]);
        assert_eq!(path.to_string(), r#"tool."a.b"[2]"#);
        assert_eq!(KeyPath::parse(&path.to_string()), path);
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let mut value = json!({});
        set_at_path(&mut value, KeyPath::parse("a.b.c").segments(), json!(1)).unwrap();
        assert_eq!(value, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut value = json!({"a": 1});
        assert!(set_at_path(&mut value, KeyPath::parse("a.b").segments(), json!(1)).is_err());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut value = json!({"a": 1, "b": 2, "c": 3});
        remove_at_path(&mut value, KeyPath::parse("a").segments());
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }
}
