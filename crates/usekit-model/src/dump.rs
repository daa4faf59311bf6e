//! Order-preserving dump of typed models
//!
//! Rewriting a whole object from its model would reorder every key. The
//! dump instead overlays the model's raw value onto the reference (the
//! value currently on disk): keys keep their reference position, new keys
//! are appended by canonical rank, and sequence elements are paired with
//! their reference counterparts before recursing.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::ordering::{Identity, Ordering, Shape};
use crate::projection::{Model, to_raw};

/// Dump `model` over `reference`. The result is always a mapping.
pub fn fancy_dump<M: Model>(model: &M, reference: Option<&Value>) -> Result<Value> {
    let raw = to_raw(model)?;
    let dumped = dump_value(&raw, reference, &Shape::Model(M::ordering()));
    if !dumped.is_object() {
        return Err(Error::Type {
            message: format!("{} did not dump to a mapping", M::NAME),
        });
    }
    Ok(dumped)
}

/// Overlay `new` onto `reference` following `shape`.
pub fn dump_value(new: &Value, reference: Option<&Value>, shape: &Shape) -> Value {
    let Some(reference) = reference else {
        return fresh(new, shape);
    };
    match (shape, new, reference) {
        (Shape::Model(ordering), Value::Object(map), Value::Object(old)) => {
            overlay_model(map, old, ordering)
        }
        (Shape::OneOf(options), Value::Object(map), Value::Object(old)) => {
            match select_variant(map, options) {
                Some(ordering) => overlay_model(map, old, ordering),
                None => overlay_map(map, old, &Shape::Plain),
            }
        }
        (Shape::MapOf(inner), Value::Object(map), Value::Object(old)) => {
            overlay_map(map, old, inner)
        }
        (Shape::Plain, Value::Object(map), Value::Object(old)) => {
            overlay_map(map, old, &Shape::Plain)
        }
        (Shape::SeqOf(inner, identity), Value::Array(items), Value::Array(old)) => {
            overlay_seq(items, old, inner, *identity)
        }
        (Shape::Plain, Value::Array(items), Value::Array(old)) => {
            overlay_seq(items, old, &Shape::Plain, None)
        }
        _ => fresh(new, shape),
    }
}

/// Dump with no reference: canonical order for models, model order
/// otherwise.
fn fresh(new: &Value, shape: &Shape) -> Value {
    match (shape, new) {
        (Shape::Model(ordering), Value::Object(map)) => fresh_model(map, ordering),
        (Shape::OneOf(options), Value::Object(map)) => match select_variant(map, options) {
            Some(ordering) => fresh_model(map, ordering),
            None => new.clone(),
        },
        (Shape::MapOf(inner), Value::Object(map)) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), fresh(value, inner)))
                .collect(),
        ),
        (Shape::SeqOf(inner, _), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| fresh(item, inner)).collect())
        }
        _ => new.clone(),
    }
}

fn fresh_model(map: &Map<String, Value>, ordering: &Ordering) -> Value {
    let mut out = Map::new();
    for key in ranked_keys(map.keys(), ordering) {
        out.insert(key.clone(), fresh(&map[key], ordering.shape_of(key)));
    }
    Value::Object(out)
}

/// Keys with a canonical rank first, in rank order, then the rest in the
/// order given.
fn ranked_keys<'a>(
    keys: impl Iterator<Item = &'a String>,
    ordering: &Ordering,
) -> Vec<&'a String> {
    let mut keys: Vec<&String> = keys.collect();
    keys.sort_by_key(|key| ordering.rank(key).unwrap_or(usize::MAX));
    keys
}

fn overlay_model(map: &Map<String, Value>, old: &Map<String, Value>, ordering: &Ordering) -> Value {
    let mut out = Map::new();
    for (key, old_value) in old {
        match map.get(key) {
            Some(value) => {
                out.insert(
                    key.clone(),
                    dump_value(value, Some(old_value), ordering.shape_of(key)),
                );
            }
            None if !ordering.knows(key) => {
                out.insert(key.clone(), old_value.clone());
            }
            None => {}
        }
    }
    let added = ranked_keys(map.keys().filter(|key| !old.contains_key(*key)), ordering);
    for key in added {
        out.insert(key.clone(), fresh(&map[key], ordering.shape_of(key)));
    }
    Value::Object(out)
}

fn overlay_map(map: &Map<String, Value>, old: &Map<String, Value>, inner: &Shape) -> Value {
    let mut out = Map::new();
    for (key, old_value) in old {
        if let Some(value) = map.get(key) {
            out.insert(key.clone(), dump_value(value, Some(old_value), inner));
        }
    }
    for (key, value) in map {
        if !old.contains_key(key) {
            out.insert(key.clone(), fresh(value, inner));
        }
    }
    Value::Object(out)
}

fn overlay_seq(
    items: &[Value],
    old: &[Value],
    inner: &Shape,
    identity: Option<Identity>,
) -> Value {
    let mut used = vec![false; old.len()];
    let old_keys: Vec<Vec<String>> = match identity {
        Some(identity) => old.iter().map(identity).collect(),
        None => Vec::new(),
    };
    let dumped = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let counterpart = match identity {
                Some(identity) => {
                    let keys = identity(item);
                    (0..old.len()).find(|&i| !used[i] && old_keys[i].iter().any(|key| keys.contains(key)))
                }
                None => (idx < old.len()).then_some(idx),
            };
            match counterpart {
                Some(i) => {
                    used[i] = true;
                    dump_value(item, Some(&old[i]), inner)
                }
                None => fresh(item, inner),
            }
        })
        .collect();
    Value::Array(dumped)
}

/// The first model whose schema knows every key of `map`
fn select_variant(
    map: &Map<String, Value>,
    options: &[&'static Ordering],
) -> Option<&'static Ordering> {
    options
        .iter()
        .copied()
        .find(|ordering| map.keys().all(|key| ordering.knows(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::struct_fields;
    use crate::ordering::FieldOrder;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Abc {
        #[serde(skip_serializing_if = "Option::is_none")]
        a: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        b: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        c: Option<u8>,
    }

    static ABC: Ordering = Ordering {
        model: "Abc",
        schema: struct_fields::<Abc>,
        fields: &[
            FieldOrder::plain("a"),
            FieldOrder::plain("b"),
            FieldOrder::plain("c"),
        ],
    };

    impl Model for Abc {
        const NAME: &'static str = "Abc";

        fn ordering() -> &'static Ordering {
            &ABC
        }
    }

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_reference_order_kept_and_new_keys_ranked() {
        let model = Abc {
            a: Some(1),
            b: Some(2),
            c: Some(3),
        };
        let reference = json!({"b": 2, "a": 1});
        let dumped = fancy_dump(&model, Some(&reference)).unwrap();
        assert_eq!(keys(&dumped), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_fresh_dump_uses_canonical_order() {
        let model = Abc {
            a: None,
            b: Some(2),
            c: Some(3),
        };
        assert_eq!(keys(&fancy_dump(&model, None).unwrap()), vec!["b", "c"]);
    }

    #[test]
    fn test_unset_known_keys_are_dropped_unknown_kept() {
        let model = Abc {
            a: Some(1),
            b: None,
            c: None,
        };
        let reference = json!({"x-note": "keep", "b": 2, "a": 0});
        let dumped = fancy_dump(&model, Some(&reference)).unwrap();
        assert_eq!(dumped, json!({"x-note": "keep", "a": 1}));
    }

    #[test]
    fn test_sequences_pair_by_identity() {
        static ITEM: Shape = Shape::Plain;
        fn id(v: &Value) -> Vec<String> {
            v.get("id").and_then(Value::as_str).map(str::to_string).into_iter().collect()
        }
        let reference = json!([{"extra": 1, "id": "b"}, {"id": "a"}]);
        let new = json!([{"id": "a"}, {"id": "b", "extra": 1}, {"id": "c"}]);
        let shape = Shape::SeqOf(&ITEM, Some(id));
        let dumped = dump_value(&new, Some(&reference), &shape);
        assert_eq!(keys(&dumped[1]), vec!["extra", "id"]);
        assert_eq!(dumped[2], json!({"id": "c"}));
    }

    #[test]
    fn test_scalar_root_is_a_type_error() {
        #[derive(Serialize, Deserialize)]
        struct Wrapped(u8);
        impl Model for Wrapped {
            const NAME: &'static str = "Wrapped";
            fn ordering() -> &'static Ordering {
                &ABC
            }
        }
        let err = fancy_dump(&Wrapped(1), None).unwrap_err();
        assert!(matches!(err, Error::Type { .. }));
    }
}
