//! Rich-text (lexical editor state) traversal.
//!
//! A rich-text value looks like `{"root": {"children": [...], ...}}`. Every
//! node may carry `children`; text-bearing nodes carry a `text` attribute next
//! to inert formatting attributes. Lexical paths are expressed relative to the
//! `root` node as alternating `children` keys and indices, e.g.
//! `children.1.children.0`.

use crate::path::{FieldPath, PathSegment};
use serde_json::Value;

const ROOT: &str = "root";
const CHILDREN: &str = "children";
const TEXT: &str = "text";

/// A text leaf found inside a rich-text state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalText {
    /// Location of the node relative to `root`
    pub path: FieldPath,
    pub text: String,
}

/// Whether `value` looks like a rich-text editor state.
///
/// Shape check only: an object whose `root` is an object with a `children`
/// member. This is the one place that decides what counts as rich text.
pub fn is_rich_text_state(value: &Value) -> bool {
    value
        .get(ROOT)
        .and_then(Value::as_object)
        .is_some_and(|root| root.contains_key(CHILDREN))
}

/// Collect every non-empty text leaf of a rich-text state in pre-order.
///
/// Malformed states (not an object, no `root` object) yield nothing.
pub fn walk(state: &Value) -> Vec<LexicalText> {
    let mut found = Vec::new();
    if let Some(root) = state.get(ROOT).filter(|root| root.is_object()) {
        let mut path = FieldPath::root();
        walk_node(root, &mut path, &mut found);
    }
    found
}

fn walk_node(node: &Value, path: &mut FieldPath, found: &mut Vec<LexicalText>) {
    let Some(node) = node.as_object() else {
        return;
    };

    if let Some(text) = node.get(TEXT).and_then(Value::as_str) {
        if !text.is_empty() {
            found.push(LexicalText {
                path: path.clone(),
                text: text.to_string(),
            });
        }
    }

    if let Some(children) = node.get(CHILDREN).and_then(Value::as_array) {
        path.push(PathSegment::Key(CHILDREN.to_string()));
        for (index, child) in children.iter().enumerate() {
            path.push(PathSegment::Index(index));
            walk_node(child, path, found);
            path.pop();
        }
        path.pop();
    }
}

/// Resolve the node at `lexical_path` inside a rich-text state.
pub fn node_mut<'a>(state: &'a mut Value, lexical_path: &FieldPath) -> Option<&'a mut Value> {
    let root = state.get_mut(ROOT)?;
    lexical_path.resolve_mut(root)
}

/// Overwrite the `text` attribute of the node at `lexical_path`.
///
/// Returns `false` without touching anything when the node does not exist
/// or carries no `text` attribute. Sibling attributes are never modified.
pub fn set_text(state: &mut Value, lexical_path: &FieldPath, text: &str) -> bool {
    match node_mut(state, lexical_path).and_then(|node| node.get_mut(TEXT)) {
        Some(slot) => {
            *slot = Value::String(text.to_string());
            true
        }
        None => false,
    }
}
