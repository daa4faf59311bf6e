//! Canonical order tables
//!
//! Presentation policy for freshly written keys, kept apart from the serde
//! models themselves. Tables are `static` values that reference each other
//! through [`Shape`] so the dump engine can walk nested models.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Error, Result};

/// Identity keys of a sequence element. An element pairs with the first
/// unpaired on-disk element sharing any of its keys.
pub type Identity = fn(&Value) -> Vec<String>;

/// How the value under a field is laid out.
#[derive(Debug)]
pub enum Shape {
    /// Scalars, or structures without a canonical order
    Plain,
    /// A nested model
    Model(&'static Ordering),
    /// A sequence; elements are paired by identity when one is given,
    /// otherwise by position
    SeqOf(&'static Shape, Option<Identity>),
    /// A mapping with arbitrary keys and uniformly shaped values
    MapOf(&'static Shape),
    /// One of several models, tried in order
    OneOf(&'static [&'static Ordering]),
}

pub static PLAIN: Shape = Shape::Plain;

/// Position and shape of one field
#[derive(Debug)]
pub struct FieldOrder {
    pub name: &'static str,
    pub shape: &'static Shape,
}

impl FieldOrder {
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            shape: &Shape::Plain,
        }
    }

    pub const fn new(name: &'static str, shape: &'static Shape) -> Self {
        Self { name, shape }
    }
}

/// Canonical field order of one model type
#[derive(Debug)]
pub struct Ordering {
    pub model: &'static str,
    /// Field names the model actually has
    pub schema: fn() -> Option<&'static [&'static str]>,
    pub fields: &'static [FieldOrder],
}

impl Ordering {
    /// Canonical rank of `key`, if it has one
    pub fn rank(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == key)
    }

    pub fn shape_of(&self, key: &str) -> &'static Shape {
        self.fields
            .iter()
            .find(|f| f.name == key)
            .map(|f| f.shape)
            .unwrap_or(&PLAIN)
    }

    /// Whether the model has a field called `key`
    pub fn knows(&self, key: &str) -> bool {
        match (self.schema)() {
            Some(fields) => fields.contains(&key),
            None => self.rank(key).is_some(),
        }
    }

    /// Check that every ranked field exists on the model.
    pub fn check(&self) -> Result<()> {
        let Some(schema) = (self.schema)() else {
            return Err(Error::Ordering {
                model: self.model,
                field: "<model is not a struct>".to_string(),
            });
        };
        for field in self.fields {
            if !schema.contains(&field.name) {
                return Err(Error::Ordering {
                    model: self.model,
                    field: field.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// This table and every table reachable from it, each once
    pub fn reachable(&'static self) -> Vec<&'static Ordering> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(ordering) = pending.pop() {
            if !seen.insert(ordering as *const Ordering) {
                continue;
            }
            found.push(ordering);
            for field in ordering.fields {
                collect_orderings(field.shape, &mut pending);
            }
        }
        found
    }
}

fn collect_orderings(shape: &'static Shape, pending: &mut Vec<&'static Ordering>) {
    match shape {
        Shape::Plain => {}
        Shape::Model(ordering) => pending.push(*ordering),
        Shape::SeqOf(inner, _) | Shape::MapOf(inner) => collect_orderings(inner, pending),
        Shape::OneOf(options) => pending.extend(options.iter().copied()),
    }
}

/// Validate every table reachable from `roots`.
pub fn check_all(roots: &[&'static Ordering]) -> Result<()> {
    let mut checked = HashSet::new();
    for root in roots {
        for ordering in root.reachable() {
            if checked.insert(ordering as *const Ordering) {
                ordering.check()?;
            }
        }
    }
    tracing::debug!(tables = checked.len(), "canonical order tables validated");
    Ok(())
}
