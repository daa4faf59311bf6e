//! YAML tree with block splicing
//!
//! serde_yaml drops comments, so edits are written back by splicing: the
//! source is cut by indentation into mapping entries and sequence items,
//! blocks whose value did not change are copied verbatim and the splice
//! recurses into changed blocks so only the changed leaves are dumped again.
//! When the spliced text does not load back to the edited value (an anchor
//! inside a rewritten block, flow-style collections, exotic keys) only
//! whole top-level keys are spliced, and failing that the whole document is
//! dumped.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::Tree;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::path::{self, KeyPath};

/// A mapping key at the start of the text: quoted, or plain not starting
/// with an indicator character.
static MAPPING_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^("(?:[^"\\]|\\.)*"|'(?:[^']|'')*'|(?:[^\s#'"?:\[\]{},&*!|>%@`-]|-\S)[^#\n]*?)[ \t]*:(?:[ \t]|\r?\n|$)"#,
    )
    .expect("mapping key regex is valid")
});

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([^\s\[\]{},]+)").expect("anchor regex is valid"));

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^\s\[\]{},]+)").expect("alias regex is valid"));

/// YAML document. Keeps the source text next to the loaded value.
#[derive(Debug)]
pub struct YamlTree {
    source: String,
    original: Value,
    current: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Mapping,
    Sequence,
}

/// One mapping entry or sequence item of a block
#[derive(Debug)]
struct Segment {
    /// `None` for sequence items
    key: Option<String>,
    /// Comment lines directly above the entry
    lead: String,
    /// The key or dash line and everything up to the next entry
    body: String,
}

impl YamlTree {
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        let value = load(source).map_err(|e| Error::decode(Format::Yaml, path, e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            original: value.clone(),
            current: value,
        })
    }

    fn loads_back(&self, text: &str) -> bool {
        matches!(load(text), Ok(reloaded) if reloaded == self.current)
    }

    fn splice(&self) -> Result<Option<String>> {
        if let Some(out) = splice_block(&self.source, &self.original, &self.current)? {
            if self.loads_back(&out) {
                return Ok(Some(out));
            }
            tracing::debug!("nested YAML splice did not load back, splicing top-level keys");
        }
        self.splice_top_level()
    }

    /// Splice whole top-level keys, rewriting every key that aliases an
    /// anchor of a rewritten key.
    fn splice_top_level(&self) -> Result<Option<String>> {
        let (Value::Object(original), Value::Object(current)) = (&self.original, &self.current)
        else {
            return Ok(None);
        };

        let (header, segments) = split_block(&self.source, 0, Layout::Mapping);
        if !segments
            .iter()
            .map(|s| s.key.as_deref())
            .eq(original.keys().map(|key| Some(key.as_str())))
        {
            tracing::debug!("YAML layout not recognised, dumping the whole document");
            return Ok(None);
        }

        let mut rewritten: HashSet<&str> = original
            .iter()
            .filter(|(key, value)| current.get(*key) != Some(*value))
            .map(|(key, _)| key.as_str())
            .collect();
        taint_aliases(&segments, &mut rewritten);

        let by_key: HashMap<&str, &Segment> = segments
            .iter()
            .filter_map(|s| Some((s.key.as_deref()?, s)))
            .collect();

        let mut out = header;
        ensure_newline(&mut out);
        for (key, value) in current {
            if let Some(segment) = by_key.get(key.as_str()) {
                out.push_str(&segment.lead);
                if !rewritten.contains(key.as_str()) {
                    out.push_str(&segment.body);
                    ensure_newline(&mut out);
                    continue;
                }
            }
            out.push_str(&dump_entry(key, value)?);
        }

        if self.loads_back(&out) {
            Ok(Some(out))
        } else {
            tracing::debug!("spliced YAML did not load back, dumping the whole document");
            Ok(None)
        }
    }

    fn dump_all(&self) -> Result<String> {
        let (mut out, _) = split_block(&self.source, 0, Layout::Mapping);
        ensure_newline(&mut out);
        let dumped = serde_yaml::to_string(&self.current)
            .map_err(|e| Error::unsupported(Format::Yaml, "<root>", e.to_string()))?;
        out.push_str(&dumped);
        Ok(out)
    }
}

impl Tree for YamlTree {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn to_value(&self) -> Value {
        self.current.clone()
    }

    fn get(&self, key_path: &KeyPath) -> Option<Value> {
        path::get_at_path(&self.current, key_path.segments()).cloned()
    }

    fn set(&mut self, key_path: &KeyPath, value: &Value) -> Result<()> {
        path::set_at_path(&mut self.current, key_path.segments(), value.clone())
            .map_err(|reason| Error::unsupported(Format::Yaml, key_path.to_string(), reason))
    }

    fn remove(&mut self, key_path: &KeyPath) -> Result<Option<Value>> {
        if key_path.is_empty() {
            return Err(Error::unsupported(
                Format::Yaml,
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
        match self.splice()? {
            Some(text) => Ok(text),
            None => self.dump_all(),
        }
    }
}

/// Load YAML text. Empty and comment-only documents load as an empty mapping.
fn load(source: &str) -> std::result::Result<Value, serde_yaml::Error> {
    if !source.lines().any(is_content) {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_yaml::from_str(source)?;
    Ok(if value.is_null() {
        Value::Object(Map::new())
    } else {
        value
    })
}

// ============================================================================
// Block splicing
// ============================================================================

/// Rewrite `text`, the block-style source of `original`, so it holds
/// `current`. `None` when the text is not laid out the way the value is.
fn splice_block(text: &str, original: &Value, current: &Value) -> Result<Option<String>> {
    let (content, tail) = split_tail(text);
    let Some(first) = content.split_inclusive('\n').find(|line| is_content(line)) else {
        return Ok(None);
    };
    let column = indent_of(first);

    let spliced = match (original, current) {
        (Value::Object(original), Value::Object(current)) => {
            let (header, segments) = split_block(content, column, Layout::Mapping);
            let keys_match = segments
                .iter()
                .map(|s| s.key.as_deref())
                .eq(original.keys().map(|key| Some(key.as_str())));
            if !keys_match || header.lines().any(is_content) {
                return Ok(None);
            }
            Some(header + &splice_mapping(&segments, original, current, column)?)
        }
        (Value::Array(original), Value::Array(current)) => {
            let (header, segments) = split_block(content, column, Layout::Sequence);
            if segments.len() != original.len() || header.lines().any(is_content) {
                return Ok(None);
            }
            Some(header + &splice_sequence(&segments, original, current, column)?)
        }
        _ => None,
    };
    Ok(spliced.map(|mut out| {
        ensure_newline(&mut out);
        out.push_str(tail);
        out
    }))
}

fn splice_mapping(
    segments: &[Segment],
    original: &Map<String, Value>,
    current: &Map<String, Value>,
    column: usize,
) -> Result<String> {
    let mut out = String::new();
    for (key, value) in current {
        let found = segments
            .iter()
            .zip(original.values())
            .find(|(segment, _)| segment.key.as_deref() == Some(key.as_str()));
        match found {
            Some((segment, old)) => {
                out.push_str(&segment.lead);
                if old == value {
                    out.push_str(&segment.body);
                } else {
                    match splice_segment(segment, old, value, column)? {
                        Some(text) => out.push_str(&text),
                        None => out.push_str(&indent(&dump_entry(key, value)?, column)),
                    }
                }
            }
            None => out.push_str(&indent(&dump_entry(key, value)?, column)),
        }
        ensure_newline(&mut out);
    }
    Ok(out)
}

fn splice_sequence(
    segments: &[Segment],
    original: &[Value],
    current: &[Value],
    column: usize,
) -> Result<String> {
    let mut out = String::new();
    for (value, counterpart) in current.iter().zip(pair_items(original, current)) {
        match counterpart {
            Some(i) => {
                let segment = &segments[i];
                out.push_str(&segment.lead);
                if original[i] == *value {
                    out.push_str(&segment.body);
                } else {
                    match splice_segment(segment, &original[i], value, column)? {
                        Some(text) => out.push_str(&text),
                        None => out.push_str(&indent(&dump_item(value)?, column)),
                    }
                }
            }
            None => out.push_str(&indent(&dump_item(value)?, column)),
        }
        ensure_newline(&mut out);
    }
    Ok(out)
}

/// Recurse into the value of a changed entry. `None` when the value is
/// written inline and has to be dumped again.
fn splice_segment(segment: &Segment, old: &Value, new: &Value, column: usize) -> Result<Option<String>> {
    let (head, children) = split_head(&segment.body);
    let rest = match &segment.key {
        Some(_) => match MAPPING_KEY.find(&head[column..]) {
            Some(m) => &head[column + m.end()..],
            None => return Ok(None),
        },
        None => &head[column + 1..],
    };
    if opens_block(rest) {
        return Ok(splice_block(children, old, new)?.map(|text| format!("{head}{text}")));
    }
    if segment.key.is_some() {
        return Ok(None);
    }

    // `- key: value` or `- - item`: the item is a block one column right of
    // the dash.
    let mut block = String::with_capacity(segment.body.len());
    block.push_str(&head[..column]);
    block.push(' ');
    block.push_str(rest);
    block.push_str(children);
    Ok(splice_block(&block, old, new)?.and_then(|text| restore_dash(&text, column)))
}

/// Pair each current item with the original item it came from. Equal items
/// pair in order; the rest pair by position between those, when they
/// still share some content.
fn pair_items(original: &[Value], current: &[Value]) -> Vec<Option<usize>> {
    let mut pairs: Vec<Option<usize>> = vec![None; current.len()];
    let mut next = 0;
    for (i, value) in current.iter().enumerate() {
        if let Some(j) = (next..original.len()).find(|&j| original[j] == *value) {
            pairs[i] = Some(j);
            next = j + 1;
        }
    }
    for i in 0..current.len() {
        if pairs[i].is_some() {
            continue;
        }
        let low = pairs[..i].iter().rev().find_map(|p| *p).map_or(0, |j| j + 1);
        let high = pairs[i + 1..].iter().find_map(|p| *p).unwrap_or(original.len());
        pairs[i] = (low..high).find(|&j| overlaps(&original[j], &current[i]));
    }
    pairs
}

/// Whether two collections have an equal member somewhere below the top.
fn overlaps(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => a.iter().any(|(key, value)| {
            b.get(key)
                .is_some_and(|other| other == value || overlaps(value, other))
        }),
        (Value::Array(a), Value::Array(b)) => a.iter().any(|value| b.contains(value)),
        _ => false,
    }
}

/// Cut `text` into entries starting at `column`. Lines above the first
/// entry are returned separately.
fn split_block(text: &str, column: usize, layout: Layout) -> (String, Vec<Segment>) {
    let mut header = String::new();
    let mut segments: Vec<Segment> = Vec::new();

    for line in text.split_inclusive('\n') {
        if let Some(key) = entry_start(line, column, layout) {
            let lead = segments
                .last_mut()
                .map(|prev| take_trailing_comments(&mut prev.body, column))
                .unwrap_or_default();
            segments.push(Segment {
                key,
                lead,
                body: line.to_string(),
            });
        } else if let Some(segment) = segments.last_mut() {
            segment.body.push_str(line);
        } else {
            header.push_str(line);
        }
    }
    (header, segments)
}

/// The key (or `None` for an item) of the entry `line` starts at `column`.
fn entry_start(line: &str, column: usize, layout: Layout) -> Option<Option<String>> {
    if indent_of(line) != column {
        return None;
    }
    let rest = &line[column..];
    match layout {
        Layout::Mapping => mapping_key(rest).map(Some),
        Layout::Sequence => {
            let item = rest.starts_with("- ") || rest.trim_end() == "-";
            item.then_some(None)
        }
    }
}

fn mapping_key(line: &str) -> Option<String> {
    let token = MAPPING_KEY.captures(line)?.get(1)?.as_str();
    if token.starts_with('"') || token.starts_with('\'') {
        serde_yaml::from_str::<String>(token).ok()
    } else {
        Some(token.trim_end().to_string())
    }
}

/// Detach the comment lines ending `body` that sit at or left of `column`.
/// The first line of `body` is never detached.
fn take_trailing_comments(body: &mut String, column: usize) -> String {
    let lines: Vec<&str> = body.split_inclusive('\n').collect();
    let comments = lines[1..]
        .iter()
        .rev()
        .take_while(|line| line.trim_start().starts_with('#') && indent_of(line) <= column)
        .count();
    let keep = lines.len() - comments;
    let split_at: usize = lines[..keep].iter().map(|l| l.len()).sum();
    body.split_off(split_at)
}

/// Split off the blank lines ending `text`.
fn split_tail(text: &str) -> (&str, &str) {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let blank = lines.iter().rev().take_while(|line| line.trim().is_empty()).count();
    let split_at: usize = lines[..lines.len() - blank].iter().map(|l| l.len()).sum();
    text.split_at(split_at)
}

fn split_head(body: &str) -> (&str, &str) {
    match body.find('\n') {
        Some(end) => body.split_at(end + 1),
        None => (body, ""),
    }
}

/// Whether the text after a key or dash leaves the value to the following
/// lines: nothing, a comment, or an anchor.
fn opens_block(rest: &str) -> bool {
    let mut rest = rest.trim();
    if rest.starts_with('&') {
        rest = rest
            .find(char::is_whitespace)
            .map_or("", |end| rest[end..].trim_start());
    }
    rest.is_empty() || rest.starts_with('#')
}

/// Put the dash back in front of the first content line of a spliced item.
fn restore_dash(text: &str, column: usize) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut restored = false;
    for line in text.split_inclusive('\n') {
        if !restored && is_content(line) {
            if indent_of(line) <= column {
                return None;
            }
            out.push_str(&line[..column]);
            out.push('-');
            out.push_str(&line[column + 1..]);
            restored = true;
        } else {
            out.push_str(line);
        }
    }
    restored.then_some(out)
}

fn is_content(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#') && line != "---"
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn indent(text: &str, column: usize) -> String {
    let pad = " ".repeat(column);
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect()
}

/// Extend `rewritten` with every top-level key that aliases an anchor
/// defined under a rewritten key, until nothing changes.
fn taint_aliases<'a>(segments: &'a [Segment], rewritten: &mut HashSet<&'a str>) {
    fn names<'a>(pattern: &Regex, text: &'a str) -> HashSet<&'a str> {
        pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect()
    }
    let keyed: Vec<(&str, HashSet<&str>, HashSet<&str>)> = segments
        .iter()
        .filter_map(|s| Some((s.key.as_deref()?, names(&ANCHOR, &s.body), names(&ALIAS, &s.body))))
        .collect();

    loop {
        let lost: HashSet<&str> = keyed
            .iter()
            .filter(|(key, _, _)| rewritten.contains(key))
            .flat_map(|(_, anchors, _)| anchors.iter().copied())
            .collect();
        let newly: Vec<&str> = keyed
            .iter()
            .filter(|(key, _, aliases)| {
                !rewritten.contains(key) && aliases.iter().any(|name| lost.contains(name))
            })
            .map(|(key, _, _)| *key)
            .collect();
        if newly.is_empty() {
            return;
        }
        rewritten.extend(newly);
    }
}

fn dump_entry(key: &str, value: &Value) -> Result<String> {
    let mut entry = Map::new();
    entry.insert(key.to_string(), value.clone());
    serde_yaml::to_string(&Value::Object(entry))
        .map_err(|e| Error::unsupported(Format::Yaml, key, e.to_string()))
}

fn dump_item(value: &Value) -> Result<String> {
    serde_yaml::to_string(&Value::Array(vec![value.clone()]))
        .map_err(|e| Error::unsupported(Format::Yaml, "<item>", e.to_string()))
}

fn ensure_newline(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}
