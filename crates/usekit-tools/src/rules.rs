//! Linter rule sets
//!
//! A [`RuleSet`] keeps four buckets of rule codes. Managed rules belong to
//! one tool and go away with it. Unmanaged rules are shared with whatever
//! else configured them: they are added alongside a tool but never removed
//! on its behalf.
//!
//! Selecting an ignored rule does not un-ignore it; the ignore keeps the rule
//! inactive while the selection is still recorded.

use serde_json::Value;
use usekit_content::{KeyPath, OpenMode};
use usekit_core::Project;

use crate::error::Result;
use crate::tool::ConfigLocation;

/// Rule codes a tool contributes to a linter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub selected: Vec<String>,
    pub ignored: Vec<String>,
    pub unmanaged_selected: Vec<String>,
    pub unmanaged_ignored: Vec<String>,
}

fn push_unique(bucket: &mut Vec<String>, rule: &str) -> bool {
    if bucket.iter().any(|existing| existing == rule) {
        return false;
    }
    bucket.push(rule.to_string());
    true
}

fn remove_rule(bucket: &mut Vec<String>, rule: &str) -> bool {
    let before = bucket.len();
    bucket.retain(|existing| existing != rule);
    bucket.len() != before
}

fn ordered_union<'a>(buckets: impl IntoIterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut merged = Vec::new();
    for rule in buckets.into_iter().flatten() {
        push_unique(&mut merged, rule);
    }
    merged
}

fn strings(rules: &[&str]) -> Vec<String> {
    rules.iter().map(|rule| rule.to_string()).collect()
}

impl RuleSet {
    pub fn selecting(rules: &[&str]) -> Self {
        Self {
            selected: strings(rules),
            ..Self::default()
        }
    }

    pub fn with_ignored(mut self, rules: &[&str]) -> Self {
        self.ignored = strings(rules);
        self
    }

    pub fn with_unmanaged_selected(mut self, rules: &[&str]) -> Self {
        self.unmanaged_selected = strings(rules);
        self
    }

    pub fn with_unmanaged_ignored(mut self, rules: &[&str]) -> Self {
        self.unmanaged_ignored = strings(rules);
        self
    }

    /// Record `rule` as managed-selected unless it is selected already.
    pub fn select(&mut self, rule: &str) -> bool {
        if self.unmanaged_selected.iter().any(|existing| existing == rule) {
            return false;
        }
        push_unique(&mut self.selected, rule)
    }

    /// Drop `rule` from the managed selection. Unmanaged rules stay.
    pub fn deselect(&mut self, rule: &str) -> bool {
        remove_rule(&mut self.selected, rule)
    }

    pub fn ignore(&mut self, rule: &str) -> bool {
        if self.unmanaged_ignored.iter().any(|existing| existing == rule) {
            return false;
        }
        push_unique(&mut self.ignored, rule)
    }

    pub fn unignore(&mut self, rule: &str) -> bool {
        remove_rule(&mut self.ignored, rule)
    }

    pub fn all_selected(&self) -> Vec<String> {
        ordered_union([&self.selected, &self.unmanaged_selected])
    }

    pub fn all_ignored(&self) -> Vec<String> {
        ordered_union([&self.ignored, &self.unmanaged_ignored])
    }

    /// Selected and not ignored
    pub fn is_active(&self, rule: &str) -> bool {
        self.all_selected().iter().any(|r| r == rule) && !self.all_ignored().iter().any(|r| r == rule)
    }

    /// Bucket-wise union, keeping the order of `self` first
    pub fn union(&self, other: &RuleSet) -> RuleSet {
        RuleSet {
            selected: ordered_union([&self.selected, &other.selected]),
            ignored: ordered_union([&self.ignored, &other.ignored]),
            unmanaged_selected: ordered_union([&self.unmanaged_selected, &other.unmanaged_selected]),
            unmanaged_ignored: ordered_union([&self.unmanaged_ignored, &other.unmanaged_ignored]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
            && self.ignored.is_empty()
            && self.unmanaged_selected.is_empty()
            && self.unmanaged_ignored.is_empty()
    }
}

// ============================================================================
// Persisted rule lists
// ============================================================================

const SELECT: &str = "lint.select";
const IGNORE: &str = "lint.ignore";

/// A linter whose rule selection lives in a configuration file
pub trait Linter {
    fn linter_name(&self) -> &'static str;

    /// Where the `lint.select` / `lint.ignore` lists are stored
    fn rules_location(&self, project: &Project) -> ConfigLocation;

    fn selected_rules(&self, project: &Project) -> Result<Vec<String>> {
        read_rules(project, &self.rules_location(project), SELECT)
    }

    fn ignored_rules(&self, project: &Project) -> Result<Vec<String>> {
        read_rules(project, &self.rules_location(project), IGNORE)
    }

    /// Append the rules not selected yet. Returns whether any were added.
    fn select_rules(&self, project: &Project, rules: &[String]) -> Result<bool> {
        let location = self.rules_location(project);
        let added = extend_rules(project, &location, SELECT, rules)?;
        report(project, "Selecting", self.linter_name(), &added, location.file);
        Ok(!added.is_empty())
    }

    fn deselect_rules(&self, project: &Project, rules: &[String]) -> Result<bool> {
        let location = self.rules_location(project);
        let removed = remove_rules(project, &location, SELECT, rules)?;
        report(project, "Deselecting", self.linter_name(), &removed, location.file);
        Ok(!removed.is_empty())
    }

    fn ignore_rules(&self, project: &Project, rules: &[String]) -> Result<bool> {
        let location = self.rules_location(project);
        let added = extend_rules(project, &location, IGNORE, rules)?;
        report(project, "Ignoring", self.linter_name(), &added, location.file);
        Ok(!added.is_empty())
    }

    fn unignore_rules(&self, project: &Project, rules: &[String]) -> Result<bool> {
        let location = self.rules_location(project);
        let removed = remove_rules(project, &location, IGNORE, rules)?;
        report(project, "No longer ignoring", self.linter_name(), &removed, location.file);
        Ok(!removed.is_empty())
    }

    /// Select everything `rules` selects and ignore everything it ignores.
    fn apply_rule_set(&self, project: &Project, rules: &RuleSet) -> Result<()> {
        self.select_rules(project, &rules.all_selected())?;
        self.ignore_rules(project, &rules.all_ignored())?;
        Ok(())
    }

    /// Undo the managed part of `rules`; unmanaged rules remain.
    fn remove_rule_set(&self, project: &Project, rules: &RuleSet) -> Result<()> {
        self.deselect_rules(project, &rules.selected)?;
        self.unignore_rules(project, &rules.ignored)?;
        Ok(())
    }
}

fn rules_key(location: &ConfigLocation, list: &str) -> KeyPath {
    location.key(&KeyPath::parse(list))
}

fn read_rules(project: &Project, location: &ConfigLocation, list: &str) -> Result<Vec<String>> {
    if !project.has_file(location.file) {
        return Ok(Vec::new());
    }
    let doc = project.store().open(project.path(location.file), OpenMode::Existing)?;
    let rules = doc
        .get(&rules_key(location, list))
        .ok()
        .and_then(|value| value.as_array().cloned())
        .unwrap_or_default();
    doc.close()?;
    Ok(rules
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn extend_rules(project: &Project, location: &ConfigLocation, list: &str, rules: &[String]) -> Result<Vec<String>> {
    if rules.is_empty() {
        return Ok(Vec::new());
    }
    let key = rules_key(location, list);
    let doc = project
        .store()
        .open(project.path(location.file), OpenMode::CreateIfMissing)?;
    let mut added: Vec<String> = Vec::new();
    for rule in rules {
        let value = Value::String(rule.clone());
        if !doc.list_contains(&key, &value) && !added.contains(rule) {
            added.push(rule.clone());
        }
    }
    let values: Vec<Value> = added.iter().cloned().map(Value::String).collect();
    doc.extend_list(&key, &values)?;
    doc.close()?;
    Ok(added)
}

fn remove_rules(project: &Project, location: &ConfigLocation, list: &str, rules: &[String]) -> Result<Vec<String>> {
    if rules.is_empty() || !project.has_file(location.file) {
        return Ok(Vec::new());
    }
    let key = rules_key(location, list);
    let doc = project.store().open(project.path(location.file), OpenMode::Existing)?;
    let removed: Vec<String> = rules
        .iter()
        .filter(|rule| doc.list_contains(&key, &Value::String((*rule).clone())))
        .cloned()
        .collect();
    let values: Vec<Value> = removed.iter().cloned().map(Value::String).collect();
    doc.remove_from_list(&key, &values)?;
    doc.close()?;
    Ok(removed)
}

fn report(project: &Project, verb: &str, linter: &str, rules: &[String], file: &str) {
    if rules.is_empty() {
        return;
    }
    let noun = if rules.len() == 1 { "rule" } else { "rules" };
    let quoted: Vec<String> = rules.iter().map(|rule| format!("'{rule}'")).collect();
    project.tick(&format!(
        "{verb} {linter} {noun} {} in '{file}'.",
        quoted.join(", ")
    ));
}
