use serde_json::{Map, Value};

use crate::error::ReconError;
use crate::model::FlatRecord;

/// Separator used between parent and child keys unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = "_";

/// Flatten a nested provider object into a single-level record.
///
/// - Nested objects: `parent{sep}child`.
/// - Arrays whose first element is an object: one branch per element,
///   `parent{sep}{index}`.
/// - Other arrays (including empty ones): stored whole as their JSON text.
/// - Scalars: stored as-is.
///
/// When two branches produce the same key the one visited last wins.
pub fn flatten(record: &Map<String, Value>, sep: &str) -> FlatRecord {
    let mut out = FlatRecord::new();
    flatten_into(&mut out, record, "", sep);
    out
}

/// Flatten a raw payload. `null` is treated as an empty response.
pub fn flatten_payload(provider: &str, payload: &Value, sep: &str) -> Result<FlatRecord, ReconError> {
    match payload {
        Value::Null => Ok(FlatRecord::new()),
        Value::Object(map) => Ok(flatten(map, sep)),
        _ => Err(ReconError::NotAnObject {
            provider: provider.to_string(),
        }),
    }
}

fn flatten_into(out: &mut FlatRecord, map: &Map<String, Value>, parent: &str, sep: &str) {
    for (key, value) in map {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}{sep}{key}")
        };
        flatten_value(out, path, value, sep);
    }
}

fn flatten_value(out: &mut FlatRecord, path: String, value: &Value, sep: &str) {
    match value {
        Value::Object(child) => flatten_into(out, child, &path, sep),
        Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(out, format!("{path}{sep}{i}"), item, sep);
            }
        }
        Value::Array(items) => {
            let text = serde_json::to_string(items).unwrap_or_default();
            out.insert(path, Value::String(text));
        }
        scalar => out.insert(path, scalar.clone()),
    }
}
