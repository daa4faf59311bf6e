//! TOML tree using toml_edit for format preservation

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table};

use super::Tree;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::path::{Key, KeyPath};

type Reconcile<T> = std::result::Result<T, String>;

/// TOML document backed by `toml_edit`.
///
/// Writes are reconciled against the existing items: keys, values and array
/// elements that do not change keep their decor (comments, whitespace,
/// quoting), and tables keep their header positions.
#[derive(Debug)]
pub struct TomlTree {
    doc: DocumentMut,
}

impl TomlTree {
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        let doc: DocumentMut = source
            .parse()
            .map_err(|e: toml_edit::TomlError| Error::decode(Format::Toml, path, e.to_string()))?;
        Ok(Self { doc })
    }

    fn unsupported(path: &KeyPath, reason: impl Into<String>) -> Error {
        Error::unsupported(Format::Toml, path.to_string(), reason)
    }
}

impl Tree for TomlTree {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn to_value(&self) -> Value {
        table_to_json(self.doc.as_table())
    }

    fn get(&self, path: &KeyPath) -> Option<Value> {
        let mut current = self.doc.as_item();
        for key in path.segments() {
            current = match key {
                Key::Name(name) => current.as_table_like()?.get(name)?,
                Key::Index(idx) => current.get(*idx)?,
            };
        }
        Some(item_to_json(current))
    }

    fn set(&mut self, path: &KeyPath, value: &Value) -> Result<()> {
        let Some((parent_path, last)) = path.split_last() else {
            let Value::Object(map) = value else {
                return Err(Self::unsupported(path, "the document root must be a table"));
            };
            return merge_table(self.doc.as_table_mut(), map)
                .map_err(|reason| Self::unsupported(path, reason));
        };

        let mut current = self.doc.as_item_mut();
        for key in parent_path.segments() {
            current = match key {
                Key::Name(name) => {
                    let standard = current.is_table();
                    let table = current.as_table_like_mut().ok_or_else(|| {
                        Self::unsupported(path, format!("'{name}' is not inside a table"))
                    })?;
                    if !table.contains_key(name) {
                        table.insert(name, empty_table(standard));
                    }
                    table
                        .get_mut(name)
                        .ok_or_else(|| Self::unsupported(path, format!("'{name}' vanished")))?
                }
                Key::Index(idx) => current
                    .get_mut(*idx)
                    .ok_or_else(|| Self::unsupported(path, format!("index {idx} does not exist")))?,
            };
        }

        let reconciled = match last {
            Key::Name(name) => {
                let standard = current.is_table();
                let table = current
                    .as_table_like_mut()
                    .ok_or_else(|| Self::unsupported(path, "parent is not a table"))?;
                match table.get_mut(name) {
                    Some(existing) => merge_item(existing, value, standard),
                    None => new_item(value, standard).map(|item| {
                        table.insert(name, item);
                    }),
                }
            }
            Key::Index(idx) => match current.get_mut(*idx) {
                Some(existing) => merge_item(existing, value, false),
                None => Err(format!("index {idx} does not exist")),
            },
        };
        reconciled.map_err(|reason| Self::unsupported(path, reason))
    }

    fn remove(&mut self, path: &KeyPath) -> Result<Option<Value>> {
        let Some((parent_path, last)) = path.split_last() else {
            return Err(Self::unsupported(path, "cannot remove the document root"));
        };

        let mut current = self.doc.as_item_mut();
        for key in parent_path.segments() {
            let next = match key {
                Key::Name(name) => current.as_table_like_mut().and_then(|t| t.get_mut(name)),
                Key::Index(idx) => current.get_mut(*idx),
            };
            match next {
                Some(item) => current = item,
                None => return Ok(None),
            }
        }

        let removed = match last {
            Key::Name(name) => current
                .as_table_like_mut()
                .and_then(|table| table.remove(name))
                .map(|item| item_to_json(&item)),
            Key::Index(idx) => match current {
                Item::Value(toml_edit::Value::Array(arr)) if *idx < arr.len() => {
                    Some(value_to_json(&arr.remove(*idx)))
                }
                Item::ArrayOfTables(aot) if *idx < aot.len() => {
                    let removed = aot.get(*idx).map(table_to_json);
                    aot.remove(*idx);
                    removed
                }
                _ => None,
            },
        };
        Ok(removed)
    }

    fn render(&self) -> Result<String> {
        Ok(self.doc.to_string())
    }
}

fn empty_table(standard: bool) -> Item {
    if standard {
        let mut table = Table::new();
        table.set_implicit(true);
        Item::Table(table)
    } else {
        Item::Value(toml_edit::Value::InlineTable(InlineTable::new()))
    }
}

fn table_to_json(table: &Table) -> Value {
    let map: Map<String, Value> = table
        .iter()
        .map(|(key, item)| (key.to_string(), item_to_json(item)))
        .collect();
    Value::Object(map)
}

fn item_to_json(item: &Item) -> Value {
    match item {
        Item::Value(v) => value_to_json(v),
        Item::Table(t) => table_to_json(t),
        Item::ArrayOfTables(arr) => Value::Array(arr.iter().map(table_to_json).collect()),
        Item::None => Value::Null,
    }
}

fn value_to_json(v: &toml_edit::Value) -> Value {
    match v {
        toml_edit::Value::String(s) => Value::String(s.value().to_string()),
        toml_edit::Value::Integer(i) => Value::Number((*i.value()).into()),
        toml_edit::Value::Float(f) => serde_json::Number::from_f64(*f.value())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
        toml_edit::Value::Datetime(d) => Value::String(d.value().to_string()),
        toml_edit::Value::Array(arr) => Value::Array(arr.iter().map(value_to_json).collect()),
        toml_edit::Value::InlineTable(t) => Value::Object(
            t.iter()
                .map(|(key, value)| (key.to_string(), value_to_json(value)))
                .collect(),
        ),
    }
}

/// Build a fresh item. Mappings inside standard tables become standard
/// tables; everything else is an inline value.
fn new_item(value: &Value, standard: bool) -> Reconcile<Item> {
    match value {
        Value::Object(map) if standard => Ok(Item::Table(new_table(map)?)),
        other => Ok(Item::Value(new_value(other)?)),
    }
}

fn new_table(map: &Map<String, Value>) -> Reconcile<Table> {
    let mut table = Table::new();
    for (key, value) in map {
        table.insert(key, new_item(value, true)?);
    }
    if !map.is_empty() && map.values().all(Value::is_object) {
        table.set_implicit(true);
    }
    Ok(table)
}

fn new_value(value: &Value) -> Reconcile<toml_edit::Value> {
    match value {
        Value::Null => Err("TOML has no null value".to_string()),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(f) = n.as_f64() {
                Ok(f.into())
            } else {
                Err(format!("number {n} is out of range for TOML"))
            }
        }
        Value::String(s) => Ok(s.as_str().into()),
        Value::Array(items) => {
            let mut arr = Array::new();
            for item in items {
                arr.push_formatted(new_value(item)?);
            }
            arr.fmt();
            Ok(toml_edit::Value::Array(arr))
        }
        Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, value) in map {
                table.insert(key.as_str(), new_value(value)?);
            }
            table.fmt();
            Ok(toml_edit::Value::InlineTable(table))
        }
    }
}

fn key_ranks(map: &Map<String, Value>) -> HashMap<&str, usize> {
    map.keys()
        .enumerate()
        .map(|(rank, key)| (key.as_str(), rank))
        .collect()
}

fn merge_item(existing: &mut Item, new: &Value, standard: bool) -> Reconcile<()> {
    if item_to_json(existing) == *new {
        return Ok(());
    }
    match (existing, new) {
        (Item::Table(table), Value::Object(map)) => merge_table(table, map),
        (Item::Value(value), new) if !new.is_object() || value.is_inline_table() => {
            merge_value(value, new)
        }
        (Item::ArrayOfTables(aot), Value::Array(items)) if items.iter().all(Value::is_object) => {
            merge_array_of_tables(aot, items)
        }
        (existing, new) => {
            *existing = new_item(new, standard)?;
            Ok(())
        }
    }
}

fn merge_table(table: &mut Table, map: &Map<String, Value>) -> Reconcile<()> {
    let stale: Vec<String> = table
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !map.contains_key(key))
        .collect();
    for key in stale {
        table.remove(&key);
    }

    for (key, value) in map {
        match table.get_mut(key) {
            Some(existing) => merge_item(existing, value, true)?,
            None => {
                table.insert(key, new_item(value, true)?);
            }
        }
    }

    let ranks = key_ranks(map);
    let in_order = table
        .iter()
        .map(|(key, _)| ranks.get(key).copied().unwrap_or(usize::MAX))
        .is_sorted();
    if !in_order {
        table.sort_values_by(|k1, _, k2, _| {
            let r1 = ranks.get(k1.get()).copied().unwrap_or(usize::MAX);
            let r2 = ranks.get(k2.get()).copied().unwrap_or(usize::MAX);
            r1.cmp(&r2)
        });
    }
    Ok(())
}

fn merge_inline(table: &mut InlineTable, map: &Map<String, Value>) -> Reconcile<()> {
    let stale: Vec<String> = table
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !map.contains_key(key))
        .collect();
    for key in stale {
        table.remove(&key);
    }

    for (key, value) in map {
        match table.get_mut(key) {
            Some(existing) => merge_value(existing, value)?,
            None => {
                table.insert(key.as_str(), new_value(value)?);
            }
        }
    }

    let ranks = key_ranks(map);
    let in_order = table
        .iter()
        .map(|(key, _)| ranks.get(key).copied().unwrap_or(usize::MAX))
        .is_sorted();
    if !in_order {
        table.sort_values_by(|k1, _, k2, _| {
            let r1 = ranks.get(k1.get()).copied().unwrap_or(usize::MAX);
            let r2 = ranks.get(k2.get()).copied().unwrap_or(usize::MAX);
            r1.cmp(&r2)
        });
    }
    Ok(())
}

fn merge_value(existing: &mut toml_edit::Value, new: &Value) -> Reconcile<()> {
    if value_to_json(existing) == *new {
        return Ok(());
    }
    match (existing, new) {
        (toml_edit::Value::InlineTable(table), Value::Object(map)) => merge_inline(table, map),
        (toml_edit::Value::Array(arr), Value::Array(items)) => merge_array(arr, items),
        (existing, new) => {
            let mut fresh = new_value(new)?;
            *fresh.decor_mut() = existing.decor().clone();
            *existing = fresh;
            Ok(())
        }
    }
}

/// Rebuild an array so that it holds `items`, reusing every existing
/// element that is still wanted (with its comments and layout).
///
/// New elements copy the leading whitespace of the last existing element so
/// multi-line arrays stay multi-line; whitespace before the closing bracket
/// stays at the end.
fn merge_array(arr: &mut Array, items: &[Value]) -> Reconcile<()> {
    let old: Vec<toml_edit::Value> = arr.iter().cloned().collect();
    let old_json: Vec<Value> = old.iter().map(value_to_json).collect();
    let mut used = vec![false; old.len()];

    let multiline_prefix = old
        .last()
        .and_then(|last| last.decor().prefix())
        .and_then(|prefix| prefix.as_str())
        .and_then(|prefix| prefix.rfind('\n').map(|at| prefix[at..].to_string()));
    let closing_ws = old
        .last()
        .and_then(|last| last.decor().suffix())
        .and_then(|suffix| suffix.as_str())
        .filter(|suffix| suffix.trim().is_empty())
        .map(str::to_string);

    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let reused = (0..old.len()).find(|&i| !used[i] && old_json[i] == *item);
        match reused {
            Some(i) => {
                used[i] = true;
                result.push(old[i].clone());
            }
            None => {
                let mut fresh = new_value(item)?;
                if let Some(prefix) = &multiline_prefix {
                    fresh.decor_mut().set_prefix(prefix.as_str());
                }
                result.push(fresh);
            }
        }
    }

    if multiline_prefix.is_none() {
        for (index, value) in result.iter_mut().enumerate() {
            let inline_ws = value
                .decor()
                .prefix()
                .and_then(|prefix| prefix.as_str())
                .is_some_and(|prefix| prefix.trim().is_empty() && !prefix.contains('\n'));
            if inline_ws {
                value.decor_mut().set_prefix(if index == 0 { "" } else { " " });
            }
        }
    }

    if closing_ws.is_some() {
        for value in result.iter_mut() {
            let blank_suffix = value
                .decor()
                .suffix()
                .and_then(|suffix| suffix.as_str())
                .is_some_and(|suffix| suffix.trim().is_empty());
            if blank_suffix {
                value.decor_mut().set_suffix("");
            }
        }
        if let (Some(last), Some(ws)) = (result.last_mut(), &closing_ws) {
            last.decor_mut().set_suffix(ws.as_str());
        }
    }

    arr.clear();
    for value in result {
        arr.push_formatted(value);
    }
    Ok(())
}

fn merge_array_of_tables(aot: &mut ArrayOfTables, items: &[Value]) -> Reconcile<()> {
    let old: Vec<Table> = aot.iter().cloned().collect();
    let mut tables = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Value::Object(map) = item else {
            return Err("array of tables can only hold tables".to_string());
        };
        match old.get(idx) {
            Some(table) => {
                let mut table = table.clone();
                merge_table(&mut table, map)?;
                tables.push(table);
            }
            None => tables.push(new_table(map)?),
        }
    }
    aot.clear();
    for table in tables {
        aot.push(table);
    }
    Ok(())
}
