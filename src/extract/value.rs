use serde_json::{Map, Value};

use crate::extract::catalog::Row;

/// JSON truthiness as used throughout the extractors: null, `false`, zero,
/// and empty strings/arrays/objects all count as absent.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Best-effort display form. Null renders empty; containers render as
/// compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Resolve a scalar field to a string; absent and falsy values resolve to
/// the empty string.
pub fn get_str(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(value) if truthy(value) => display_string(value),
        _ => String::new(),
    }
}

/// First non-empty string among the candidate keys, in priority order.
pub fn first_str(record: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        let resolved = get_str(record, key);
        if !resolved.is_empty() {
            return resolved;
        }
    }
    String::new()
}

/// Resolve a list-valued field. A one-element array wrapping an inner array
/// is unwrapped to the inner array; absent, null and non-array values
/// resolve to the empty list.
pub fn get_list(record: &Map<String, Value>, key: &str) -> Vec<Value> {
    match record.get(key) {
        Some(Value::Array(items)) => match items.as_slice() {
            [Value::Array(inner)] => inner.clone(),
            _ => items.clone(),
        },
        _ => Vec::new(),
    }
}

/// Resolve `{"label": ...}` / `{"name": ...}` objects to their display
/// label, falling back to the whole value's string form.
pub fn label_of(value: &Value) -> String {
    if let Value::Object(map) = value {
        for key in ["label", "name"] {
            if let Some(inner) = map.get(key) {
                return display_string(inner);
            }
        }
    }
    display_string(value)
}

/// Join a list of label objects into one display string; non-object
/// elements are stringified directly.
pub fn join_labels(items: &[Value]) -> String {
    items.iter().map(label_of).collect::<Vec<_>>().join(", ")
}

/// Label of a single object, or of the first element when the field holds a
/// list.
pub fn first_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items.first().map(label_of).unwrap_or_default(),
        Some(object @ Value::Object(_)) => label_of(object),
        _ => String::new(),
    }
}

/// Resolve `record[key][sub]` where `record[key]` is an object, else empty.
pub fn nested_str(record: &Map<String, Value>, key: &str, sub: &str) -> String {
    match record.get(key) {
        Some(Value::Object(map)) => get_str(map, sub),
        _ => String::new(),
    }
}

/// Boolean flag coercion: JSON truthiness, `false` when absent.
pub fn get_flag(record: &Map<String, Value>, key: &str) -> bool {
    record.get(key).map(truthy).unwrap_or(false)
}

/// Integer count coercion: numbers truncate, numeric strings parse,
/// anything else falls back to the default.
pub fn get_count(record: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(default)
        }
        _ => default,
    }
}

pub(crate) fn set_text(row: &mut Row, column: &str, value: String) {
    row.insert(column.to_string(), Value::String(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_scalar_defaults() {
        let rec = record(json!({
            "present": "hello",
            "empty": "",
            "null": null,
            "zero": 0,
            "number": 42
        }));

        assert_eq!(get_str(&rec, "present"), "hello");
        assert_eq!(get_str(&rec, "empty"), "");
        assert_eq!(get_str(&rec, "null"), "");
        assert_eq!(get_str(&rec, "zero"), "");
        assert_eq!(get_str(&rec, "number"), "42");
        assert_eq!(get_str(&rec, "missing"), "");
    }

    #[test]
    fn test_first_str_priority() {
        let rec = record(json!({"a": "", "b": null, "c": "found", "d": "later"}));
        assert_eq!(first_str(&rec, &["a", "b", "c", "d"]), "found");
        assert_eq!(first_str(&rec, &["a", "b"]), "");
    }

    #[test]
    fn test_get_list_unwraps_single_wrapper() {
        let rec = record(json!({
            "plain": [1, 2, 3],
            "wrapped": [[1, 2]],
            "empty": [],
            "scalar": "x"
        }));

        assert_eq!(get_list(&rec, "plain").len(), 3);
        assert_eq!(get_list(&rec, "wrapped"), vec![json!(1), json!(2)]);
        assert!(get_list(&rec, "empty").is_empty());
        assert!(get_list(&rec, "scalar").is_empty());
        assert!(get_list(&rec, "missing").is_empty());
    }

    #[test]
    fn test_join_labels() {
        let items = vec![
            json!({"label": "Paris"}),
            json!({"name": "Lyon"}),
            json!("Nice"),
        ];
        assert_eq!(join_labels(&items), "Paris, Lyon, Nice");
        assert_eq!(join_labels(&[]), "");
    }

    #[test]
    fn test_first_label_object_or_list() {
        assert_eq!(first_label(Some(&json!({"label": "Bretagne"}))), "Bretagne");
        assert_eq!(first_label(Some(&json!([{"label": "Bretagne"}, {"label": "Alsace"}]))), "Bretagne");
        assert_eq!(first_label(Some(&json!(["Bretagne"]))), "Bretagne");
        assert_eq!(first_label(Some(&json!([]))), "");
        assert_eq!(first_label(None), "");
    }

    #[test]
    fn test_flags_and_counts() {
        let rec = record(json!({
            "yes": true,
            "no": false,
            "one": 1,
            "n": 7,
            "n_str": "12",
            "n_float": 3.9,
            "junk": {"a": 1}
        }));

        assert!(get_flag(&rec, "yes"));
        assert!(!get_flag(&rec, "no"));
        assert!(get_flag(&rec, "one"));
        assert!(!get_flag(&rec, "missing"));

        assert_eq!(get_count(&rec, "n", 0), 7);
        assert_eq!(get_count(&rec, "n_str", 0), 12);
        assert_eq!(get_count(&rec, "n_float", 0), 3);
        assert_eq!(get_count(&rec, "junk", 0), 0);
        assert_eq!(get_count(&rec, "missing", 0), 0);
    }
}
