//! Document persistence boundary.
//!
//! The translation service only needs to read a document in its source
//! locale and write a document in a target locale. [`ContentStore`] captures
//! exactly that; [`MemoryStore`] backs tests and local runs, and
//! [`crate::db::PgStore`] backs production.

use crate::Document;
use anyhow::Result;
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Document identifier as sent by clients: numeric or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Number(i64),
    Text(String),
}

impl DocumentId {
    /// The JSON value stored under a document's `id` key.
    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Number(n) => Value::from(*n),
            DocumentId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Number(n) => write!(f, "{}", n),
            DocumentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        DocumentId::Number(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Text(id.to_string())
    }
}

/// Locale-aware document storage.
pub trait ContentStore: Send + Sync {
    /// Fetch a document in one locale. `Ok(None)` when it does not exist.
    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>>;

    /// Write `data` as the given locale's version of a document and return
    /// the stored result. Top-level keys in `data` replace stored ones; keys
    /// not present in `data` are kept.
    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
        data: Document,
    ) -> BoxFuture<'a, Result<Document>>;
}

type StoreKey = (String, String, String);

/// In-process store keyed by `(collection, id, locale)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<StoreKey, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &DocumentId, locale: &str) -> StoreKey {
        (collection.to_string(), id.to_string(), locale.to_string())
    }

    /// Store a document as-is, without stamping system fields.
    pub fn insert(&self, collection: &str, id: &DocumentId, locale: &str, document: Document) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.insert(Self::key(collection, id, locale), document);
    }

    /// Read a document synchronously.
    pub fn get(&self, collection: &str, id: &DocumentId, locale: &str) -> Option<Document> {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        documents.get(&Self::key(collection, id, locale)).cloned()
    }

    fn write(&self, collection: &str, id: &DocumentId, locale: &str, data: Document) -> Document {
        let now = Value::String(Utc::now().to_rfc3339());
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        let stored = documents
            .entry(Self::key(collection, id, locale))
            .or_default();

        for (key, value) in data {
            stored.insert(key, value);
        }
        stored.insert("id".to_string(), id.to_value());
        if !stored.contains_key("createdAt") {
            stored.insert("createdAt".to_string(), now.clone());
        }
        stored.insert("updatedAt".to_string(), now);

        stored.clone()
    }
}

impl ContentStore for MemoryStore {
    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>> {
        Box::pin(async move { Ok(self.get(collection, id, locale)) })
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
        data: Document,
    ) -> BoxFuture<'a, Result<Document>> {
        Box::pin(async move { Ok(self.write(collection, id, locale, data)) })
    }
}
