// Path-based value lookup over JSON payloads
use serde_json::Value;

/// Resolve `path` against `root`. `None` means the value is missing.
///
/// When traversal reaches an array, the segment is looked up on the
/// array's first element, mirroring how fields are discovered.
pub fn get_value<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        let segment = segment.as_ref();
        current = match current {
            Value::Null => return None,
            Value::Array(items) => lookup(items.first()?, segment)?,
            other => lookup(other, segment)?,
        };
    }
    Some(current)
}

fn lookup<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_path_returns_root() {
        let root = json!({"a": 1});
        assert_eq!(get_value::<&str>(&root, &[]), Some(&root));
    }

    #[test]
    fn test_nested_lookup() {
        let root = json!({"quote": {"price": {"last": 101.5}}});
        assert_eq!(get_value(&root, &["quote", "price", "last"]), Some(&json!(101.5)));
        assert_eq!(get_value(&root, &["quote", "volume"]), None);
    }

    #[test]
    fn test_arrays_resolve_against_first_element() {
        let root = json!({"items": [{"a": 1}, {"a": 2}]});
        assert_eq!(get_value(&root, &["items", "a"]), Some(&json!(1)));
        assert_eq!(get_value(&json!({"items": []}), &["items", "a"]), None);
    }

    #[test]
    fn test_null_short_circuits() {
        let root = json!({"quote": null});
        assert_eq!(get_value(&root, &["quote"]), Some(&Value::Null));
        assert_eq!(get_value(&root, &["quote", "price"]), None);
    }

    #[test]
    fn test_primitives_have_no_children() {
        let root = json!({"name": "TCS"});
        assert_eq!(get_value(&root, &["name", "length"]), None);
    }

    #[test]
    fn test_numeric_segment_on_nested_array() {
        let root = json!([[10, 20]]);
        assert_eq!(get_value(&root, &["1"]), Some(&json!(20)));
    }
}
