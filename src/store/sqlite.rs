//! SQLite-backed document store
//!
//! Documents live as JSON text in a single `documents` table keyed by
//! `(collection, doc_key)`, where `doc_key` is the JSON-encoded projection of
//! the document onto its key fields. Filtering, sorting and projection are
//! evaluated over the decoded documents; collections here are one week of
//! batch data, not a query engine's worth.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::filter::project;
use crate::store::{Document, DocumentStore, Filter, Sort, UpsertCounts};

/// Document store over a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", path.display());
        debug!("Connecting to database: {}", db_url);
        let pool = SqlitePool::connect(&db_url).await?;

        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store; a single connection so every caller sees one database
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }
}

async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            doc_key TEXT NOT NULL,
            doc TEXT NOT NULL,
            PRIMARY KEY (collection, doc_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Document store schema initialized");
    Ok(())
}

/// Deterministic key string: the key-field values in declaration order
fn key_string(doc: &Document, key_fields: &[&str]) -> Result<String> {
    let mut key_values = Vec::with_capacity(key_fields.len());
    for field in key_fields {
        let value = doc.get(field).ok_or_else(|| {
            Error::InvalidDocument(format!("missing key field '{}'", field))
        })?;
        key_values.push(value.clone());
    }
    Ok(serde_json::to_string(&key_values)?)
}

/// Shallow-merge `incoming` over `stored`; stored fields not present in the
/// incoming document survive
fn merge_fields(stored: &mut Document, incoming: &Document) {
    if let (Value::Object(target), Value::Object(source)) = (stored, incoming) {
        for (field, value) in source {
            target.insert(field.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn upsert_by_key(
        &self,
        collection: &str,
        docs: &[Document],
        key_fields: &[&str],
    ) -> Result<UpsertCounts> {
        if docs.is_empty() {
            debug!("Save data : {} : count = 0 :: done", collection);
            return Ok(UpsertCounts::default());
        }

        let mut counts = UpsertCounts::default();
        let mut tx = self.pool.begin().await?;

        for doc in docs {
            let doc_key = key_string(doc, key_fields)?;

            let existing: Option<String> = sqlx::query_scalar(
                "SELECT doc FROM documents WHERE collection = ? AND doc_key = ?",
            )
            .bind(collection)
            .bind(&doc_key)
            .fetch_optional(&mut *tx)
            .await?;

            match existing {
                Some(stored_text) => {
                    let mut stored: Document = serde_json::from_str(&stored_text)?;
                    merge_fields(&mut stored, doc);
                    sqlx::query(
                        "UPDATE documents SET doc = ? WHERE collection = ? AND doc_key = ?",
                    )
                    .bind(serde_json::to_string(&stored)?)
                    .bind(collection)
                    .bind(&doc_key)
                    .execute(&mut *tx)
                    .await?;
                    counts.updated += 1;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO documents (collection, doc_key, doc) VALUES (?, ?, ?)",
                    )
                    .bind(collection)
                    .bind(&doc_key)
                    .bind(serde_json::to_string(doc)?)
                    .execute(&mut *tx)
                    .await?;
                    counts.inserted += 1;
                }
            }
        }

        tx.commit().await?;
        info!(
            "Save data : {} : inserted = {} : updated = {} :: done",
            collection, counts.inserted, counts.updated
        );
        Ok(counts)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&[&str]>,
        sort: Option<&Sort>,
    ) -> Result<Vec<Document>> {
        debug!("Get data : {} :: start", collection);
        let rows = sqlx::query("SELECT doc FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::new();
        for row in rows {
            let text: String = row.get("doc");
            let doc: Document = serde_json::from_str(&text)?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }

        if let Some(sort) = sort {
            sort.apply(&mut docs);
        }

        if let Some(fields) = projection {
            docs = docs.iter().map(|doc| project(doc, fields)).collect();
        }

        Ok(docs)
    }
}
