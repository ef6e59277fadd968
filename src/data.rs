//! Dot-path access into the data record

use serde_json::{Map, Value};

/// Look up `path` (segments separated by `.`) inside `data`.
///
/// Returns `None` as soon as a segment is missing or an intermediate
/// value is not an object.
pub fn get<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Absent values and empty strings are stored as `null`. Intermediates that
/// exist but are not objects are replaced by empty objects.
pub fn set<'a>(data: &'a mut Value, path: &str, value: Option<Value>) -> &'a mut Value {
    if path.is_empty() {
        return data;
    }

    let value = normalize(value);
    if !data.is_object() {
        *data = Value::Object(Map::new());
    }

    let mut segments = path.split('.').peekable();
    let mut current = &mut *data;
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            break;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            break;
        }
        let slot = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot;
    }
    data
}

fn normalize(value: Option<Value>) -> Value {
    match value {
        None => Value::Null,
        Some(Value::String(s)) if s.is_empty() => Value::Null,
        Some(v) => v,
    }
}
