// Field discovery over arbitrary JSON payloads
//
// Arrays are treated as homogeneous: only element 0 is sampled, so fields
// that appear only in later elements are never discovered.
use crate::domain::field::{FieldDescriptor, FieldOption, FieldType};
use serde_json::Value;
use std::collections::HashSet;

const SUGGESTED_FIELD_LIMIT: usize = 5;

/// Discover every addressable field in `value`.
///
/// Traversal is depth-first in key insertion order. Containers produce no
/// descriptor of their own except arrays; `arrays_only` suppresses the
/// descriptor of a bare array root and keeps empty arrays nested in objects.
pub fn explore(value: &Value, path_prefix: &[String], arrays_only: bool) -> Vec<FieldDescriptor> {
    explore_options(value, path_prefix, arrays_only)
        .into_iter()
        .map(|option| option.descriptor)
        .collect()
}

/// Same as [`explore`] but keeps the sampled value next to each descriptor.
pub fn explore_options(value: &Value, path_prefix: &[String], arrays_only: bool) -> Vec<FieldOption> {
    let mut fields = Vec::new();
    walk(value, path_prefix, arrays_only, &mut fields);

    // Keys are dot-joined paths, so an object key containing `.` can collide
    // with a nested path (`{"a.b": 1, "a": {"b": 2}}`); the first one wins.
    let mut seen = HashSet::new();
    fields.retain(|field| seen.insert(field.descriptor.key.clone()));
    fields
}

fn walk(value: &Value, path: &[String], arrays_only: bool, fields: &mut Vec<FieldOption>) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            if !arrays_only {
                fields.push(option(path, "Array", FieldType::Array, value));
            }
            if let Some(first) = items.first() {
                walk(first, path, arrays_only, fields);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                let mut child_path = path.to_vec();
                child_path.push(key.clone());

                match child {
                    Value::Array(items) => {
                        if arrays_only || !items.is_empty() {
                            fields.push(option(&child_path, key, FieldType::Array, child));
                        }
                        if let Some(first) = items.first() {
                            walk(first, &child_path, arrays_only, fields);
                        }
                    }
                    Value::Object(_) => walk(child, &child_path, arrays_only, fields),
                    _ => fields.push(option(&child_path, key, FieldType::of(child), child)),
                }
            }
        }
        primitive => fields.push(option(path, "Value", FieldType::of(primitive), primitive)),
    }
}

fn option(path: &[String], fallback_label: &str, field_type: FieldType, value: &Value) -> FieldOption {
    let key = if path.is_empty() {
        "root".to_string()
    } else {
        path.join(".")
    };
    let label = path
        .last()
        .cloned()
        .unwrap_or_else(|| fallback_label.to_string());

    FieldOption {
        descriptor: FieldDescriptor::new(key, label, field_type, path.to_vec()),
        value: value.clone(),
    }
}

/// Case-insensitive search over field labels and keys.
pub fn filter_fields<'a>(fields: &'a [FieldOption], query: &str) -> Vec<&'a FieldOption> {
    let query = query.trim().to_lowercase();
    fields
        .iter()
        .filter(|field| {
            query.is_empty()
                || field.descriptor.label.to_lowercase().contains(&query)
                || field.descriptor.key.to_lowercase().contains(&query)
        })
        .collect()
}

/// First array reachable from `value` in depth-first order, including
/// `value` itself.
pub fn find_first_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.values().find_map(find_first_array),
        _ => None,
    }
}

/// Default field selection for a freshly added widget.
///
/// Fields are taken from the first row of the main array when there is
/// one, so their paths are relative to a row. Types are narrowed to
/// `number` or `string`.
pub fn suggest_fields(payload: &Value) -> Vec<FieldDescriptor> {
    let source = find_first_array(payload)
        .and_then(|rows| rows.first())
        .unwrap_or(payload);

    explore(source, &[], false)
        .into_iter()
        .take(SUGGESTED_FIELD_LIMIT)
        .map(|mut field| {
            field.field_type = Some(match field.field_type {
                Some(FieldType::Number) => FieldType::Number,
                _ => FieldType::String,
            });
            field
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::value_accessor::get_value;
    use serde_json::json;

    fn keys(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|f| f.key.as_str()).collect()
    }

    #[test]
    fn test_null_yields_nothing() {
        assert!(explore(&Value::Null, &[], false).is_empty());
        assert!(explore(&json!({}), &[], false).is_empty());
    }

    #[test]
    fn test_nested_objects_flatten_to_leaves() {
        let payload = json!({
            "symbol": "TCS",
            "quote": {"price": 3500.5, "change": {"pct": 1.2}},
            "active": true
        });
        let fields = explore(&payload, &[], false);

        assert_eq!(keys(&fields), vec!["symbol", "quote.price", "quote.change.pct", "active"]);
        assert_eq!(fields[1].label, "price");
        assert_eq!(fields[1].field_type, Some(FieldType::Number));
        assert_eq!(fields[2].path, vec!["quote", "change", "pct"]);
        assert_eq!(fields[3].field_type, Some(FieldType::Boolean));
    }

    #[test]
    fn test_array_sampling_uses_first_element_only() {
        let payload = json!({"items": [{"a": 1}, {"a": 2, "b": 3}]});
        let fields = explore(&payload, &[], false);

        assert_eq!(keys(&fields), vec!["items", "items.a"]);
        assert_eq!(fields[0].field_type, Some(FieldType::Array));
        assert_eq!(fields[1].path, vec!["items", "a"]);
    }

    #[test]
    fn test_root_array() {
        let payload = json!([{"close": 10.5, "date": "2024-01-02"}]);
        let fields = explore(&payload, &[], false);
        assert_eq!(keys(&fields), vec!["root", "close", "date"]);
        assert_eq!(fields[0].label, "Array");
        assert!(fields[0].path.is_empty());

        let arrays_only = explore(&payload, &[], true);
        assert_eq!(keys(&arrays_only), vec!["close", "date"]);
    }

    #[test]
    fn test_empty_arrays() {
        let payload = json!({"gainers": [], "losers": [{"symbol": "X"}]});
        assert_eq!(keys(&explore(&payload, &[], false)), vec!["losers", "losers.symbol"]);
        assert_eq!(
            keys(&explore(&payload, &[], true)),
            vec!["gainers", "losers", "losers.symbol"]
        );
    }

    #[test]
    fn test_primitive_root() {
        let fields = explore(&json!(42), &[], false);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].key, "root");
        assert_eq!(fields[0].label, "Value");
        assert_eq!(fields[0].field_type, Some(FieldType::Number));

        let prefixed = explore(&json!("x"), &["data".to_string(), "name".to_string()], false);
        assert_eq!(prefixed[0].key, "data.name");
        assert_eq!(prefixed[0].label, "name");
    }

    #[test]
    fn test_null_leaf_is_classified_as_object() {
        let fields = explore(&json!({"change": null}), &[], false);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, Some(FieldType::Object));
    }

    #[test]
    fn test_nested_arrays_keep_keys_unique() {
        let payload = json!({"matrix": [[{"v": 1}]]});
        let fields = explore(&payload, &[], false);
        assert_eq!(keys(&fields), vec!["matrix", "matrix.v"]);
    }

    #[test]
    fn test_dotted_key_shadows_nested_path() {
        let payload = json!({"a.b": 1, "a": {"b": 2}});
        let options = explore_options(&payload, &[], false);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].descriptor.key, "a.b");
        assert_eq!(options[0].descriptor.path, vec!["a.b"]);
        assert_eq!(options[0].value, json!(1));
    }

    #[test]
    fn test_exploration_is_deterministic() {
        let payload = json!({"z": 1, "a": {"m": [1, 2]}, "b": [{"c": "d"}]});
        assert_eq!(explore(&payload, &[], false), explore(&payload, &[], false));
        assert_eq!(keys(&explore(&payload, &[], false)), vec!["z", "a.m", "b", "b.c"]);
    }

    #[test]
    fn test_paths_resolve_against_source() {
        let payload = json!({
            "meta": {"count": 2, "source": "nse"},
            "data": [{"symbol": "TCS", "price": {"last": 3500}}],
            "flag": false
        });
        for field in explore(&payload, &[], false) {
            let value = get_value(&payload, &field.path);
            let resolved = value.unwrap_or_else(|| panic!("{} did not resolve", field.key));
            if field.field_type != Some(FieldType::Array) {
                assert_eq!(Some(FieldType::of(resolved)), field.field_type, "{}", field.key);
            }
        }
    }

    #[test]
    fn test_explore_options_keep_samples() {
        let options = explore_options(&json!({"price": 12.5}), &[], false);
        assert_eq!(options[0].value, json!(12.5));
    }

    #[test]
    fn test_filter_fields() {
        let options = explore_options(&json!({"lastPrice": 1, "volume": 2, "meta": {"price_band": "x"}}), &[], false);
        let hits: Vec<&str> = filter_fields(&options, "PRICE")
            .iter()
            .map(|f| f.descriptor.key.as_str())
            .collect();
        assert_eq!(hits, vec!["lastPrice", "meta.price_band"]);
        assert_eq!(filter_fields(&options, "").len(), 3);
    }

    #[test]
    fn test_find_first_array() {
        let payload = json!({"status": "ok", "body": {"rows": [1, 2]}, "other": [3]});
        assert_eq!(find_first_array(&payload), Some(&vec![json!(1), json!(2)]));
        assert_eq!(find_first_array(&json!({"a": 1})), None);
    }

    #[test]
    fn test_suggest_fields_prefers_first_row() {
        let payload = json!({
            "data": [{"symbol": "A", "price": 1.5, "volume": 10, "open": 1, "high": 2, "low": 0.5}]
        });
        let fields = suggest_fields(&payload);
        assert_eq!(keys(&fields), vec!["symbol", "price", "volume", "open", "high"]);
        assert_eq!(fields[0].field_type, Some(FieldType::String));
        assert_eq!(fields[1].field_type, Some(FieldType::Number));

        let flat = suggest_fields(&json!({"ok": true}));
        assert_eq!(flat[0].field_type, Some(FieldType::String));
    }
}
