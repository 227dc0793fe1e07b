use crate::store::{ContentStore, DocumentId};
use crate::Document;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;

/// PostgreSQL-backed document store.
///
/// Each locale version of a document is one row; the document body is kept
/// as JSONB without system fields, which are rebuilt from the row on read.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Connected to PostgreSQL document store");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                data JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, doc_id, locale)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents table")?;

        Ok(())
    }

    async fn fetch(
        &self,
        collection: &str,
        id: &DocumentId,
        locale: &str,
    ) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT data, created_at, updated_at FROM documents
             WHERE collection = $1 AND doc_id = $2 AND locale = $3",
        )
        .bind(collection)
        .bind(id.to_string())
        .bind(locale)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load {}/{} ({})", collection, id, locale))?;

        row.map(|row| -> Result<Document> {
            let Json(data): Json<Value> = row.try_get("data")?;
            let created_at: DateTime<Utc> = row.try_get("created_at")?;
            let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
            Ok(with_system_fields(data, id, created_at, updated_at))
        })
        .transpose()
    }

    async fn upsert(
        &self,
        collection: &str,
        id: &DocumentId,
        locale: &str,
        data: Document,
    ) -> Result<Document> {
        let row = sqlx::query(
            "INSERT INTO documents (collection, doc_id, locale, data)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (collection, doc_id, locale)
             DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
             RETURNING data, created_at, updated_at",
        )
        .bind(collection)
        .bind(id.to_string())
        .bind(locale)
        .bind(Json(Value::Object(data)))
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to save {}/{} ({})", collection, id, locale))?;

        let Json(data): Json<Value> = row.try_get("data")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(with_system_fields(data, id, created_at, updated_at))
    }
}

/// Rebuild the document a client sees from a stored row.
fn with_system_fields(
    data: Value,
    id: &DocumentId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Document {
    let mut document = Document::new();
    document.insert("id".to_string(), id.to_value());
    if let Value::Object(fields) = data {
        for (key, value) in fields {
            if !matches!(key.as_str(), "id" | "createdAt" | "updatedAt") {
                document.insert(key, value);
            }
        }
    }
    document.insert(
        "createdAt".to_string(),
        Value::String(created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    document.insert(
        "updatedAt".to_string(),
        Value::String(updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    document
}

impl ContentStore for PgStore {
    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>> {
        Box::pin(self.fetch(collection, id, locale))
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        locale: &'a str,
        data: Document,
    ) -> BoxFuture<'a, Result<Document>> {
        Box::pin(self.upsert(collection, id, locale, data))
    }
}
