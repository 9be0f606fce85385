//! Traversal helpers over untyped JSON documents embedded in pages.

use serde_json::Value;
use std::collections::VecDeque;
use std::ops::ControlFlow;

use crate::error::ExtractError;

/// Parse a JSON document, naming the source in the error
pub fn parse_json(raw: &str, what: &'static str) -> Result<Value, ExtractError> {
    serde_json::from_str(raw.trim()).map_err(|source| ExtractError::Parse { what, source })
}

/// Depth-first search for the first string stored under one of `keys` that
/// `accept` turns into a value. Keys of an object are checked before its
/// children are entered; nothing deeper than `max_depth` is visited.
pub fn find_keyed_string<T>(
    value: &Value,
    keys: &[&str],
    max_depth: usize,
    accept: &dyn Fn(&str) -> Option<T>,
) -> Option<T> {
    search_keyed(value, keys, 0, max_depth, accept)
}

fn search_keyed<T>(
    value: &Value,
    keys: &[&str],
    depth: usize,
    max_depth: usize,
    accept: &dyn Fn(&str) -> Option<T>,
) -> Option<T> {
    if depth > max_depth {
        return None;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if let Value::String(s) = child {
                    if keys.contains(&key.as_str()) {
                        if let Some(found) = accept(s) {
                            return Some(found);
                        }
                    }
                }
            }
            map.values()
                .filter(|child| child.is_object() || child.is_array())
                .find_map(|child| search_keyed(child, keys, depth + 1, max_depth, accept))
        }
        Value::Array(items) => items
            .iter()
            .filter(|child| child.is_object() || child.is_array())
            .find_map(|child| search_keyed(child, keys, depth + 1, max_depth, accept)),
        _ => None,
    }
}

/// Breadth-first walk over every entry of every object and array.
///
/// `visit` receives the entry key (`None` for array elements) and its value.
/// The walk stops as soon as `visit` breaks.
pub fn walk_breadth_first<'a, T>(
    root: &'a Value,
    mut visit: impl FnMut(Option<&'a str>, &'a Value) -> ControlFlow<T>,
) -> Option<T> {
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        let entries: Box<dyn Iterator<Item = (Option<&'a str>, &'a Value)> + 'a> = match current {
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (Some(k.as_str()), v))),
            Value::Array(items) => Box::new(items.iter().map(|v| (None, v))),
            _ => continue,
        };

        for (key, value) in entries {
            if value.is_object() || value.is_array() {
                queue.push_back(value);
            }
            if let ControlFlow::Break(found) = visit(key, value) {
                return Some(found);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn non_empty(s: &str) -> Option<String> {
        (!s.is_empty()).then(|| s.to_string())
    }

    #[test]
    fn test_parse_json_reports_source() {
        let err = parse_json("{not json", "hydration state").unwrap_err();
        assert!(err.to_string().starts_with("malformed hydration state"));
        assert_eq!(parse_json(" [1] ", "block").unwrap(), json!([1]));
    }

    #[test]
    fn test_keyed_search_prefers_shallow_keys_in_document_order() {
        let doc = json!({
            "props": { "user": { "displayName": "Deep" } },
            "hostName": "",
            "name": "Shallow"
        });
        let found = find_keyed_string(&doc, &["hostName", "name", "displayName"], 8, &non_empty);
        assert_eq!(found.as_deref(), Some("Shallow"));
    }

    #[test]
    fn test_keyed_search_respects_depth_bound() {
        let doc = json!({"a": {"b": {"c": {"name": "Hidden"}}}});
        assert_eq!(find_keyed_string(&doc, &["name"], 2, &non_empty), None);
        assert_eq!(
            find_keyed_string(&doc, &["name"], 3, &non_empty).as_deref(),
            Some("Hidden")
        );
    }

    #[test]
    fn test_breadth_first_visits_shallow_entries_first() {
        let doc = json!({
            "outer": { "inner": { "deeper": { "target": 1 } } },
            "items": [ { "target": 2 } ]
        });
        let found = walk_breadth_first(&doc, |key, value| match key {
            Some("target") => ControlFlow::Break(value.clone()),
            _ => ControlFlow::Continue(()),
        });
        assert_eq!(found, Some(json!(2)));
    }
}
