//! Write translated strings back into a copy of a document.

use crate::extract::TranslatableField;
use crate::path::{FieldPath, PathSegment};
use crate::rich_text;
use crate::Document;
use serde_json::{Map, Value};
use tracing::debug;

/// Apply `translations` to a copy of `original`.
///
/// `translations[i]` is written at the address of `fields[i]`. A shorter
/// translations list leaves the remaining fields untouched, extra
/// translations are ignored. Addresses that cannot be resolved are skipped
/// one by one; the operation itself never fails.
pub fn apply_translations(
    original: &Document,
    fields: &[TranslatableField],
    translations: &[String],
) -> Document {
    let mut result = original.clone();

    for (field, translation) in fields.iter().zip(translations) {
        let applied = match &field.lexical_path {
            Some(lexical_path) => {
                apply_rich_text(&mut result, &field.path, lexical_path, translation)
            }
            None => set_value_at(&mut result, &field.path, Value::String(translation.clone())),
        };
        if !applied {
            debug!(
                "Could not write translation for {}{}",
                field.path,
                field
                    .lexical_path
                    .as_ref()
                    .map(|p| format!(" ({})", p))
                    .unwrap_or_default()
            );
        }
    }

    if translations.len() < fields.len() {
        debug!(
            "Only {} of {} fields received a translation",
            translations.len(),
            fields.len()
        );
    }

    result
}

fn apply_rich_text(
    document: &mut Document,
    path: &FieldPath,
    lexical_path: &FieldPath,
    translation: &str,
) -> bool {
    match path.lookup_mut(document) {
        Some(state) => rich_text::set_text(state, lexical_path, translation),
        None => false,
    }
}

/// Set `value` at `path`, creating missing intermediate containers.
///
/// A missing container becomes a list when the segment after it is an index,
/// an object otherwise. Returns `false` (leaving the document unchanged) when
/// the path is empty or runs into a value it cannot descend into.
pub fn set_value_at(document: &mut Document, path: &FieldPath, value: Value) -> bool {
    let Some((first, rest)) = path.segments().split_first() else {
        return false;
    };

    if rest.is_empty() {
        document.insert(first.to_key(), value);
        return true;
    }

    let key = first.to_key();
    if let Some(existing) = document.get(&key) {
        if !can_descend(existing, rest) {
            return false;
        }
    }
    let slot = document
        .entry(key)
        .or_insert_with(|| empty_container(&rest[0]));
    set_in(slot, rest, value)
}

fn set_in(node: &mut Value, segments: &[PathSegment], value: Value) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        *node = value;
        return true;
    };

    if node.is_null() {
        *node = empty_container(segment);
    }

    if let Some(next) = rest.first() {
        if let Some(existing) = child(node, segment) {
            if !existing.is_null() && !can_descend(existing, rest) {
                return false;
            }
        }
        let slot = match child_slot(node, segment, || empty_container(next)) {
            Some(slot) => slot,
            None => return false,
        };
        return set_in(slot, rest, value);
    }

    match child_slot(node, segment, || Value::Null) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Whether a write can continue below `value` along `rest`.
fn can_descend(value: &Value, rest: &[PathSegment]) -> bool {
    match (value, rest.first()) {
        (Value::Null, _) => true,
        (Value::Object(_), Some(_)) => true,
        (Value::Array(_), Some(PathSegment::Index(_))) => true,
        _ => false,
    }
}

fn child<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), segment) => map.get(&segment.to_key()),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

/// Get or create the slot for `segment` inside `node`.
fn child_slot<'a>(
    node: &'a mut Value,
    segment: &PathSegment,
    create: impl FnOnce() -> Value,
) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), segment) => Some(map.entry(segment.to_key()).or_insert_with(create)),
        (Value::Array(items), PathSegment::Index(index)) => {
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
                items[*index] = create();
            }
            items.get_mut(*index)
        }
        _ => None,
    }
}

fn empty_container(next: &PathSegment) -> Value {
    match next {
        PathSegment::Index(_) => Value::Array(Vec::new()),
        PathSegment::Key(_) => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract, TranslatableKind};
    use crate::schema::Field;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("document must be an object")
    }

    fn text_field(path: &str, value: &str) -> TranslatableField {
        TranslatableField {
            path: path.parse().unwrap(),
            lexical_path: None,
            kind: TranslatableKind::Text,
            value: value.to_string(),
        }
    }

    fn rich_field(path: &str, lexical: &str, value: &str) -> TranslatableField {
        TranslatableField {
            path: path.parse().unwrap(),
            lexical_path: Some(lexical.parse().unwrap()),
            kind: TranslatableKind::RichText,
            value: value.to_string(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_text_scenario() {
        let original = doc(json!({"title": "Hello"}));
        let fields = [text_field("title", "Hello")];
        let patched = apply_translations(&original, &fields, &strings(&["Ahoj"]));
        assert_eq!(Value::Object(patched), json!({"title": "Ahoj"}));
        assert_eq!(original["title"], json!("Hello"));
    }

    #[test]
    fn test_rich_text_scenario_preserves_attributes() {
        let original = doc(json!({
            "body": {"root": {"type": "root", "children": [
                {"type": "text", "text": "A", "format": 1},
                {"type": "paragraph", "direction": "ltr", "children": [
                    {"type": "text", "text": "B", "style": "color: red"}
                ]}
            ]}}
        }));
        let fields = vec![
            rich_field("body", "children.0", "A"),
            rich_field("body", "children.1.children.0", "B"),
        ];
        let patched = apply_translations(&original, &fields, &strings(&["X", "Y"]));

        assert_eq!(
            Value::Object(patched),
            json!({
                "body": {"root": {"type": "root", "children": [
                    {"type": "text", "text": "X", "format": 1},
                    {"type": "paragraph", "direction": "ltr", "children": [
                        {"type": "text", "text": "Y", "style": "color: red"}
                    ]}
                ]}}
            })
        );
    }

    #[test]
    fn test_partial_translations_leave_tail_untouched() {
        let original = doc(json!({"a": "1", "b": "2", "c": "3"}));
        let fields = vec![text_field("a", "1"), text_field("b", "2"), text_field("c", "3")];
        let patched = apply_translations(&original, &fields, &strings(&["uno", "dos"]));
        assert_eq!(Value::Object(patched), json!({"a": "uno", "b": "dos", "c": "3"}));
    }

    #[test]
    fn test_extra_translations_are_ignored() {
        let original = doc(json!({"a": "1"}));
        let fields = [text_field("a", "1")];
        let patched = apply_translations(&original, &fields, &strings(&["uno", "dos"]));
        assert_eq!(Value::Object(patched), json!({"a": "uno"}));
    }

    #[test]
    fn test_missing_lexical_node_is_skipped_individually() {
        let original = doc(json!({
            "title": "T",
            "body": {"root": {"children": [{"text": "A"}]}}
        }));
        let fields = vec![
            rich_field("body", "children.5", "gone"),
            rich_field("missing", "children.0", "gone"),
            text_field("title", "T"),
        ];
        let patched = apply_translations(&original, &fields, &strings(&["x", "y", "Titel"]));
        assert_eq!(
            Value::Object(patched),
            json!({"title": "Titel", "body": {"root": {"children": [{"text": "A"}]}}})
        );
    }

    #[test]
    fn test_set_value_creates_intermediate_containers() {
        let mut document = doc(json!({}));
        assert!(set_value_at(&mut document, &"meta.title".parse().unwrap(), json!("T")));
        assert!(set_value_at(&mut document, &"items.1.label".parse().unwrap(), json!("L")));
        assert_eq!(
            Value::Object(document),
            json!({"meta": {"title": "T"}, "items": [null, {"label": "L"}]})
        );
    }

    #[test]
    fn test_set_value_into_existing_array_row() {
        let mut document = doc(json!({"items": [{"id": "a", "label": "One"}]}));
        assert!(set_value_at(&mut document, &"items.0.label".parse().unwrap(), json!("Uno")));
        assert_eq!(
            Value::Object(document),
            json!({"items": [{"id": "a", "label": "Uno"}]})
        );
    }

    #[test]
    fn test_set_value_refuses_to_descend_into_primitives() {
        let mut document = doc(json!({"title": "plain", "items": ["x"]}));
        let before = document.clone();
        assert!(!set_value_at(&mut document, &"title.nested".parse().unwrap(), json!("v")));
        assert!(!set_value_at(&mut document, &"items.0.label".parse().unwrap(), json!("v")));
        assert!(!set_value_at(&mut document, &"items.label".parse().unwrap(), json!("v")));
        assert!(!set_value_at(&mut document, &FieldPath::root(), json!("v")));
        assert_eq!(document, before);
    }

    #[test]
    fn test_index_segment_on_object_uses_string_key() {
        let mut document = doc(json!({"map": {"0": "zero"}}));
        assert!(set_value_at(&mut document, &"map.0".parse().unwrap(), json!("nula")));
        assert_eq!(Value::Object(document), json!({"map": {"0": "nula"}}));
    }

    #[test]
    fn test_extract_then_patch_round_trip_on_nested_document() {
        let fields: Vec<Field> = serde_json::from_value(json!([
            {"name": "title", "type": "text", "localized": true},
            {"name": "items", "type": "array", "localized": true, "fields": [
                {"name": "label", "type": "text"},
                {"name": "note", "type": "richText"}
            ]}
        ]))
        .unwrap();
        let original = doc(json!({
            "id": 7,
            "title": "Hi",
            "items": [
                {"id": "r1", "label": "One", "note": {"root": {"children": [{"text": "n1"}]}}},
                {"id": "r2", "label": "Two"}
            ],
            "updatedAt": "2024-01-01T00:00:00Z"
        }));

        let extracted = extract(&original, &fields);
        let translations: Vec<String> = extracted.iter().map(|f| f.value.to_uppercase()).collect();
        let patched = apply_translations(&original, &extracted, &translations);

        assert_eq!(
            Value::Object(patched),
            json!({
                "id": 7,
                "title": "HI",
                "items": [
                    {"id": "r1", "label": "ONE", "note": {"root": {"children": [{"text": "N1"}]}}},
                    {"id": "r2", "label": "TWO"}
                ],
                "updatedAt": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_key_order_is_preserved() {
        let original = doc(json!({"z": "last", "a": "first", "m": "middle"}));
        let fields = [text_field("a", "first")];
        let patched = apply_translations(&original, &fields, &strings(&["prvni"]));
        let keys: Vec<&String> = patched.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
