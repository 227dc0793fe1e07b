//! Translatable field extraction.
//!
//! Walks a collection's field schema together with a document and produces
//! the ordered list of strings to translate. The order of the returned
//! records is the only link between extracted texts and the oracle's
//! response, so it must be stable: schema-declaration order, rows in list
//! order, and rich-text leaves in pre-order.

use crate::path::FieldPath;
use crate::rich_text;
use crate::schema::Field;
use crate::Document;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// How a translatable value is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslatableKind {
    Text,
    Textarea,
    RichText,
}

/// One extracted string plus the address it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatableField {
    /// Location of the field in the document
    pub path: FieldPath,

    /// Location of the text node inside a rich-text field, relative to `root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical_path: Option<FieldPath>,

    #[serde(rename = "type")]
    pub kind: TranslatableKind,

    pub value: String,
}

/// Which plain-text fields are eligible for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eligibility {
    /// Only fields that are localized, directly or through a localized ancestor
    #[default]
    LocalizedOnly,
    /// Every text and textarea field
    All,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub eligibility: Eligibility,
}

/// Extract translatable fields using the default options.
pub fn extract(document: &Document, fields: &[Field]) -> Vec<TranslatableField> {
    extract_with(document, fields, ExtractOptions::default())
}

pub fn extract_with(
    document: &Document,
    fields: &[Field],
    options: ExtractOptions,
) -> Vec<TranslatableField> {
    let mut extractor = Extractor {
        options,
        found: Vec::new(),
    };
    extractor.visit_fields(document, fields, &FieldPath::root(), false);
    extractor.found
}

/// The oracle payload for a list of extracted fields, in the same order.
pub fn texts(fields: &[TranslatableField]) -> Vec<String> {
    fields.iter().map(|f| f.value.clone()).collect()
}

struct Extractor {
    options: ExtractOptions,
    found: Vec<TranslatableField>,
}

impl Extractor {
    fn visit_fields(
        &mut self,
        data: &Map<String, Value>,
        fields: &[Field],
        path: &FieldPath,
        localized: bool,
    ) {
        for field in fields {
            self.visit_field(data, field, path, localized);
        }
    }

    fn visit_field(
        &mut self,
        data: &Map<String, Value>,
        field: &Field,
        path: &FieldPath,
        inherited_localized: bool,
    ) {
        match field {
            Field::Text(f) => self.visit_text(
                data,
                &f.name,
                f.localized || inherited_localized,
                path,
                TranslatableKind::Text,
            ),
            Field::Textarea(f) => self.visit_text(
                data,
                &f.name,
                f.localized || inherited_localized,
                path,
                TranslatableKind::Textarea,
            ),
            Field::RichText(f) => {
                let Some(state) = data.get(&f.name) else {
                    return;
                };
                let field_path = path.key(&f.name);
                for leaf in rich_text::walk(state) {
                    self.found.push(TranslatableField {
                        path: field_path.clone(),
                        lexical_path: Some(leaf.path),
                        kind: TranslatableKind::RichText,
                        value: leaf.text,
                    });
                }
            }
            Field::Group(group) => {
                let localized = inherited_localized || group.localized;
                match &group.name {
                    Some(name) => {
                        if let Some(Value::Object(nested)) = data.get(name) {
                            self.visit_fields(nested, &group.fields, &path.key(name), localized);
                        }
                    }
                    None => self.visit_fields(data, &group.fields, path, localized),
                }
            }
            Field::Array(array) => {
                let localized = inherited_localized || array.localized;
                let Some(Value::Array(rows)) = data.get(&array.name) else {
                    return;
                };
                let list_path = path.key(&array.name);
                for (index, row) in rows.iter().enumerate() {
                    if let Value::Object(row) = row {
                        self.visit_fields(row, &array.fields, &list_path.index(index), localized);
                    }
                }
            }
            Field::Blocks(blocks) => {
                let localized = inherited_localized || blocks.localized;
                let Some(Value::Array(rows)) = data.get(&blocks.name) else {
                    return;
                };
                let list_path = path.key(&blocks.name);
                for (index, row) in rows.iter().enumerate() {
                    let Value::Object(row) = row else {
                        continue;
                    };
                    let block_type = row.get("blockType").and_then(Value::as_str).unwrap_or("");
                    match blocks.block(block_type) {
                        Some(block) => self.visit_fields(
                            row,
                            &block.fields,
                            &list_path.index(index),
                            localized,
                        ),
                        None => debug!(
                            "Skipping block {} with unknown blockType '{}'",
                            list_path.index(index),
                            block_type
                        ),
                    }
                }
            }
            Field::Row(layout) | Field::Collapsible(layout) => {
                self.visit_fields(data, &layout.fields, path, inherited_localized)
            }
            Field::Tabs(tabs) => {
                for tab in &tabs.tabs {
                    let localized = inherited_localized || tab.localized;
                    match &tab.name {
                        Some(name) => {
                            if let Some(Value::Object(nested)) = data.get(name) {
                                self.visit_fields(nested, &tab.fields, &path.key(name), localized);
                            }
                        }
                        None => self.visit_fields(data, &tab.fields, path, localized),
                    }
                }
            }
            Field::Number(_)
            | Field::Checkbox(_)
            | Field::Date(_)
            | Field::Email(_)
            | Field::Code(_)
            | Field::Json(_)
            | Field::Select(_)
            | Field::Radio(_)
            | Field::Point(_)
            | Field::Relationship(_)
            | Field::Upload(_)
            | Field::Join(_)
            | Field::Ui
            | Field::Unknown => {}
        }
    }

    fn visit_text(
        &mut self,
        data: &Map<String, Value>,
        name: &str,
        localized: bool,
        path: &FieldPath,
        kind: TranslatableKind,
    ) {
        if !localized && self.options.eligibility == Eligibility::LocalizedOnly {
            return;
        }
        if let Some(Value::String(value)) = data.get(name) {
            if !value.is_empty() {
                self.found.push(TranslatableField {
                    path: path.key(name),
                    lexical_path: None,
                    kind,
                    value: value.clone(),
                });
            }
        }
    }
}
