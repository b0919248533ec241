// crates/sync-engine/src/merge.rs
//! Field-level merge of semi-structured documents
//!
//! Merge rules, applied to a copy of the base document:
//! - overlay fields replace base fields, except that two arrays are merged
//! - fields only present in the base are preserved
//! - arrays whose elements are all objects with a string `name` are merged by
//!   name: matched elements are merged recursively, unmatched overlay elements
//!   are appended, unmatched base elements are dropped, overlay order wins
//! - any other arrays are merged position by position; extra base elements
//!   are kept
//!
//! `merge(merge(b, o), o) == merge(b, o)` holds for every pair of objects.

use crate::error::MergeError;
use serde_json::{Map, Value};

const KEY_FIELD: &str = "name";

/// Merges `overlay` onto a copy of `base`
pub fn merge(base: &Value, overlay: &Value) -> Result<Value, MergeError> {
    let Value::Object(base) = base else {
        return Err(MergeError::NotAnObject { side: "base" });
    };
    let Value::Object(overlay) = overlay else {
        return Err(MergeError::NotAnObject { side: "overlay" });
    };

    Ok(Value::Object(merge_objects(base, overlay)))
}

/// Converts map-shaped `specifications[*].fields` into a one-element array
///
/// Guide exports write `"fields": {"value": 1}` where the service expects
/// `"fields": [{"name": "value", "value": 1}]`. Fields that are already
/// arrays are left alone, so normalizing twice changes nothing.
pub fn normalize_fields(document: &Value) -> Result<Value, MergeError> {
    let Value::Object(object) = document else {
        return Err(MergeError::NotAnObject { side: "desired" });
    };

    let mut normalized = object.clone();
    let Some(specifications) = normalized.get_mut("specifications") else {
        return Ok(Value::Object(normalized));
    };

    let Value::Array(specifications) = specifications else {
        return Err(MergeError::InvalidSpecifications(
            "'specifications' is not an array".to_string(),
        ));
    };

    for (index, specification) in specifications.iter_mut().enumerate() {
        let Value::Object(specification) = specification else {
            return Err(MergeError::InvalidSpecifications(format!(
                "specification #{index} is not an object"
            )));
        };

        if let Some(Value::Object(fields)) = specification.get("fields") {
            let mut field = fields.clone();
            field.insert(KEY_FIELD.to_string(), Value::from("value"));
            specification.insert(
                "fields".to_string(),
                Value::Array(vec![Value::Object(field)]),
            );
        }
    }

    Ok(Value::Object(normalized))
}

fn merge_objects(base: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, value) in overlay {
        let next = match (merged.get(key), value) {
            (Some(Value::Array(base_items)), Value::Array(overlay_items)) => {
                Value::Array(merge_arrays(base_items, overlay_items))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }

    merged
}

fn merge_arrays(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    if is_keyed(base) && is_keyed(overlay) {
        merge_keyed(base, overlay)
    } else {
        merge_positional(base, overlay)
    }
}

fn key_of(value: &Value) -> Option<&str> {
    value.as_object()?.get(KEY_FIELD)?.as_str()
}

fn is_keyed(items: &[Value]) -> bool {
    items.iter().all(|item| key_of(item).is_some())
}

fn merge_keyed(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    let mut consumed = vec![false; base.len()];

    overlay
        .iter()
        .map(|item| {
            let key = key_of(item);
            let matched = base
                .iter()
                .enumerate()
                .find(|(i, candidate)| !consumed[*i] && key_of(candidate) == key);

            match matched {
                Some((i, candidate)) => {
                    consumed[i] = true;
                    merge_elements(candidate, item)
                }
                None => item.clone(),
            }
        })
        .collect()
}

fn merge_positional(base: &[Value], overlay: &[Value]) -> Vec<Value> {
    let len = base.len().max(overlay.len());

    (0..len)
        .filter_map(|i| match (base.get(i), overlay.get(i)) {
            (Some(b), Some(o)) => Some(merge_elements(b, o)),
            (None, Some(o)) => Some(o.clone()),
            (Some(b), None) => Some(b.clone()),
            (None, None) => None,
        })
        .collect()
}

fn merge_elements(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => Value::Object(merge_objects(b, o)),
        (Value::Array(b), Value::Array(o)) => Value::Array(merge_arrays(b, o)),
        _ => overlay.clone(),
    }
}
