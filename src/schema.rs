//! Field schema: the declarative shape of a collection's documents.
//!
//! Field kinds form a closed, serde-tagged enum so every traversal has to
//! handle each kind explicitly. Type strings this crate does not know about
//! deserialize to [`Field::Unknown`] and are treated as non-translatable.

use crate::locale::LocalizationConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A leaf field holding a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField {
    pub name: String,
    #[serde(default)]
    pub localized: bool,
}

/// A group nests its fields under `name`; unnamed groups only group visually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupField {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A repeatable list of rows sharing one set of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayField {
    pub name: String,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One block type allowed in a [`BlocksField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub slug: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A list of heterogeneous rows, each tagged with `blockType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocksField {
    pub name: String,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl BlocksField {
    pub fn block(&self, slug: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.slug == slug)
    }
}

/// Presentational container; its fields live at the parent's level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutField {
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    /// Named tabs nest their data like a group, unnamed tabs do not
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub localized: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabsField {
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

/// One node of a collection's field schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Field {
    // Translatable leaves
    Text(ValueField),
    Textarea(ValueField),
    RichText(ValueField),

    // Non-translatable leaves
    Number(ValueField),
    Checkbox(ValueField),
    Date(ValueField),
    Email(ValueField),
    Code(ValueField),
    Json(ValueField),
    Select(ValueField),
    Radio(ValueField),
    Point(ValueField),
    Relationship(ValueField),
    Upload(ValueField),
    Join(ValueField),
    Ui,

    // Containers
    Group(GroupField),
    Array(ArrayField),
    Blocks(BlocksField),
    Row(LayoutField),
    Collapsible(LayoutField),
    Tabs(TabsField),

    #[serde(other)]
    Unknown,
}

/// Schema of one translatable collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub slug: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// The content config file: enabled collections plus localization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
    #[serde(default)]
    pub localization: Option<LocalizationConfig>,
}

impl ContentConfig {
    /// Load the content config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content config at {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid content config at {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ContentConfig =
            serde_json::from_str(raw).context("Failed to parse content config JSON")?;
        if let Some(duplicate) = config
            .collections
            .iter()
            .enumerate()
            .find(|(i, c)| config.collections[..*i].iter().any(|o| o.slug == c.slug))
            .map(|(_, c)| &c.slug)
        {
            anyhow::bail!("Collection '{}' is declared more than once", duplicate);
        }
        Ok(config)
    }

    /// Find an enabled collection by slug.
    pub fn collection(&self, slug: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.slug == slug)
    }
}
