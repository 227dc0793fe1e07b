//! Remove framework-managed metadata before a document is written back.

use crate::rich_text::is_rich_text_state;
use crate::Document;
use serde_json::Value;

/// Keys the content framework maintains itself at every level.
const TIMESTAMP_KEYS: [&str; 2] = ["createdAt", "updatedAt"];

/// Document identifier. Only removed at the top level: nested rows keep
/// theirs so the store can match them to existing sub-records.
const ID_KEY: &str = "id";

/// Strip system fields from a whole document.
pub fn strip_system_fields(document: &Document) -> Document {
    strip(document, true)
}

/// Strip system fields from an object, treating it as the document root
/// when `is_root` is set.
///
/// Lists are processed element by element and nested objects recursively,
/// except rich-text states, which are copied verbatim.
pub fn strip(object: &Document, is_root: bool) -> Document {
    object
        .iter()
        .filter(|(key, _)| !is_system_key(key, is_root))
        .map(|(key, value)| (key.clone(), strip_value(value)))
        .collect()
}

fn is_system_key(key: &str, is_root: bool) -> bool {
    TIMESTAMP_KEYS.contains(&key) || (is_root && key == ID_KEY)
}

fn strip_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(strip_value).collect()),
        Value::Object(_) if is_rich_text_state(value) => value.clone(),
        Value::Object(map) => Value::Object(strip(map, false)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("document must be an object")
    }

    #[test]
    fn test_root_id_removed_nested_id_kept() {
        let stripped = strip_system_fields(&doc(json!({
            "id": 1, "title": "x", "items": [{"id": 2, "val": "y"}]
        })));
        assert_eq!(
            Value::Object(stripped),
            json!({"title": "x", "items": [{"id": 2, "val": "y"}]})
        );
    }

    #[test]
    fn test_timestamps_removed_at_every_level() {
        let stripped = strip_system_fields(&doc(json!({
            "createdAt": "t0",
            "updatedAt": "t1",
            "meta": {"updatedAt": "t2", "title": "m"},
            "items": [{"id": "r", "createdAt": "t3", "nested": [{"updatedAt": "t4", "v": 1}]}]
        })));
        assert_eq!(
            Value::Object(stripped),
            json!({
                "meta": {"title": "m"},
                "items": [{"id": "r", "nested": [{"v": 1}]}]
            })
        );
    }

    #[test]
    fn test_rich_text_passes_through_verbatim() {
        let body = json!({
            "root": {
                "id": "root-id",
                "children": [
                    {"id": "n1", "text": "A", "createdAt": "keep", "updatedAt": "keep"}
                ]
            },
            "updatedAt": "also kept"
        });
        let stripped = strip_system_fields(&doc(json!({
            "id": 9,
            "updatedAt": "gone",
            "body": body.clone(),
            "blocks": [{"id": "b1", "content": body.clone(), "createdAt": "gone"}]
        })));
        assert_eq!(stripped["body"], body);
        assert_eq!(stripped["blocks"][0]["content"], body);
        assert!(stripped["blocks"][0].get("createdAt").is_none());
        assert_eq!(stripped["blocks"][0]["id"], json!("b1"));
    }

    #[test]
    fn test_primitives_and_nested_lists_pass_through() {
        let stripped = strip_system_fields(&doc(json!({
            "n": 1.5, "b": false, "s": "s", "z": null, "matrix": [[1, 2], ["a"]]
        })));
        assert_eq!(
            Value::Object(stripped),
            json!({"n": 1.5, "b": false, "s": "s", "z": null, "matrix": [[1, 2], ["a"]]})
        );
    }

    #[test]
    fn test_non_root_strip_keeps_id() {
        let stripped = strip(&doc(json!({"id": 3, "updatedAt": "t"})), false);
        assert_eq!(Value::Object(stripped), json!({"id": 3}));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = doc(json!({"id": 1, "createdAt": "t"}));
        let before = original.clone();
        let _ = strip_system_fields(&original);
        assert_eq!(original, before);
    }
}
