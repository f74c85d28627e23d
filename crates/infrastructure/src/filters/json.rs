//! JSON decoding and structural diffs.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tessera_application::{ExtensionError, FilterDefinition, FilterRun};
use tessera_domain::ArgDefinition;
use tessera_domain::template::is_identifier;

use super::decode_json;

/// `'{"a":1}' | json_parse`
#[must_use]
pub fn json_parse_filter() -> FilterDefinition {
    FilterDefinition::new("json_parse", FilterRun::sync(|_, input, _| decode_json(input)))
        .with_display_name("JSON parse")
        .with_description("Decode a JSON string")
}

/// `left | jsonDiff(right)`
#[must_use]
pub fn json_diff_filter() -> FilterDefinition {
    FilterDefinition::new(
        "jsonDiff",
        FilterRun::sync(|_, input, args| {
            let left = decode_json(input)?;
            let right = decode_json(args.into_iter().next().unwrap_or(Value::Null))?;
            serde_json::to_value(diff_values(&left, &right))
                .map_err(|e| ExtensionError::new(e.to_string()))
        }),
    )
    .with_display_name("JSON difference")
    .with_description("Compare two JSON values field by field")
    .with_arg(ArgDefinition::string("Compare to json").with_placeholder("Compare to json"))
}

/// Result of comparing two JSON values.
///
/// Each entry carries the `path` of the field; additions and removals add
/// `value`, updates add `old` and `new`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JsonDiff {
    /// Fields present only on the right.
    pub added: Vec<Value>,
    /// Fields present only on the left.
    pub removed: Vec<Value>,
    /// Fields whose value changed.
    pub updated: Vec<Value>,
    /// Fields equal on both sides.
    pub unchanged: Vec<Value>,
}

impl JsonDiff {
    /// True when nothing was added, removed or updated.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Compares `left` against `right`, descending into objects and arrays.
#[must_use]
pub fn diff_values(left: &Value, right: &Value) -> JsonDiff {
    let mut diff = JsonDiff::default();
    walk("", left, right, &mut diff);
    diff
}

fn walk(path: &str, left: &Value, right: &Value, diff: &mut JsonDiff) {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => walk_objects(path, a, b, diff),
        (Value::Array(a), Value::Array(b)) => {
            for index in 0..a.len().max(b.len()) {
                let child = format!("{path}[{index}]");
                match (a.get(index), b.get(index)) {
                    (Some(l), Some(r)) => walk(&child, l, r, diff),
                    (Some(l), None) => diff.removed.push(entry(&child, l)),
                    (None, Some(r)) => diff.added.push(entry(&child, r)),
                    (None, None) => {}
                }
            }
        }
        _ if left == right => diff.unchanged.push(entry(path, left)),
        _ => diff
            .updated
            .push(json!({ "path": path, "old": left, "new": right })),
    }
}

fn walk_objects(path: &str, a: &Map<String, Value>, b: &Map<String, Value>, diff: &mut JsonDiff) {
    for (key, l) in a {
        let child = child_path(path, key);
        match b.get(key) {
            Some(r) => walk(&child, l, r, diff),
            None => diff.removed.push(entry(&child, l)),
        }
    }
    for (key, r) in b {
        if !a.contains_key(key) {
            diff.added.push(entry(&child_path(path, key), r));
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if !is_identifier(key) {
        return format!("{parent}[{}]", Value::String(key.to_string()));
    }
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn entry(path: &str, value: &Value) -> Value {
    json!({ "path": path, "value": value })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tessera_application::HelperContext;

    fn run(filter: &FilterDefinition, input: Value, args: Vec<Value>) -> Result<Value, ExtensionError> {
        let FilterRun::Sync(f) = &filter.run else {
            panic!("expected a sync filter");
        };
        f(&HelperContext::detached(), input, args)
    }

    #[test]
    fn test_updated_field() {
        let diff = diff_values(&json!({"a": 1}), &json!({"a": 2}));
        assert_eq!(diff.updated, vec![json!({"path": "a", "old": 1, "new": 2})]);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn test_identical_objects() {
        let value = json!({"a": {"b": [1, 2]}, "c": "x"});
        let diff = diff_values(&value, &value);
        assert!(diff.is_identical());
        assert_eq!(diff.unchanged.len(), 3);
    }

    #[test]
    fn test_added_removed_and_nested_paths() {
        let diff = diff_values(
            &json!({"keep": 1, "gone": true, "list": [1, 2, 3]}),
            &json!({"keep": 1, "new key": null, "list": [1, 5]}),
        );
        assert_eq!(diff.removed, vec![
            json!({"path": "gone", "value": true}),
            json!({"path": "list[2]", "value": 3}),
        ]);
        assert_eq!(diff.added, vec![json!({"path": "[\"new key\"]", "value": null})]);
        assert_eq!(diff.updated, vec![json!({"path": "list[1]", "old": 2, "new": 5})]);
    }

    #[test]
    fn test_type_change_is_an_update() {
        let diff = diff_values(&json!({"a": {"b": 1}}), &json!({"a": [1]}));
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0]["path"], json!("a"));
    }

    #[test]
    fn test_filter_accepts_strings_and_objects() {
        let filter = json_diff_filter();
        let from_strings = run(&filter, json!(r#"{"a":1}"#), vec![json!(r#"{"a":2}"#)]).unwrap();
        let from_objects = run(&filter, json!({"a": 1}), vec![json!({"a": 2})]).unwrap();
        assert_eq!(from_strings, from_objects);
        assert_eq!(from_objects["updated"][0]["path"], json!("a"));
    }

    #[test]
    fn test_json_parse() {
        let filter = json_parse_filter();
        assert_eq!(run(&filter, json!("[1, 2]"), vec![]).unwrap(), json!([1, 2]));
        assert_eq!(run(&filter, json!(3), vec![]).unwrap(), json!(3));
        assert!(run(&filter, json!("not json"), vec![]).is_err());
    }
}
