//! Collapses nested JSON objects into a single-level record.
//!
//! Keys are visited in ascending order at every level, depth-first. With
//! [`FlattenPolicy::Merge`] an inner key lands at the top level unprefixed, so
//! when two paths end in the same key the one visited last wins: for
//! `{"a":{"id":1},"b":{"id":2}}` the result holds `id = 2`.
//!
//! Arrays are not descended into; they are stored as their compact JSON text.
//! `null` members produce no field.

use leakdex_config::FlattenPolicy;
use leakdex_core::{FieldValue, Record};
use serde_json::{Map, Value};

/// Flatten `object` into a new record.
pub fn flatten(object: &Map<String, Value>, policy: FlattenPolicy) -> Record {
    let mut record = Record::new();
    flatten_into(None, object, policy, &mut record);
    record
}

/// Flatten `object` into an existing record, overwriting colliding names.
pub fn flatten_into(
    prefix: Option<&str>,
    object: &Map<String, Value>,
    policy: FlattenPolicy,
    dest: &mut Record,
) {
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();

    for key in keys {
        let name = match (policy, prefix) {
            (FlattenPolicy::Prefixed, Some(parent)) => format!("{}.{}", parent, key),
            _ => key.clone(),
        };

        match &object[key.as_str()] {
            Value::Object(child) => flatten_into(Some(&name), child, policy, dest),
            value => {
                if let Ok(scalar) = FieldValue::try_from(value) {
                    dest.insert(name, scalar);
                }
            }
        }
    }
}

/// Serialize a JSON value with object keys sorted at every level.
///
/// Used as fingerprint input, so it must not depend on the key order the
/// document arrived in.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
