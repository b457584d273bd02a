//! SQLite-backed [`DocumentStore`] implementation.
//!
//! Each document is one row of the `documents` table; its fields are a
//! JSON object in the `fields` column. Merge updates, array-value removal
//! and batch commits run inside a transaction so the read and the write of
//! a single operation cannot interleave with another writer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqliteConnection, SqlitePool};

use folio_core::store::{
    merge_fields, remove_first_array_value, DocumentSnapshot, DocumentStore, Fields, WriteOp,
};

/// SQLite implementation of the [`DocumentStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_fields(collection: &str, id: &str, raw: &str) -> Result<Fields> {
    match serde_json::from_str::<Value>(raw)
        .with_context(|| format!("document {}/{} holds invalid JSON", collection, id))?
    {
        Value::Object(fields) => Ok(fields),
        other => anyhow::bail!(
            "document {}/{} is not a JSON object: {}",
            collection,
            id,
            other
        ),
    }
}

async fn read_fields(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
) -> Result<Option<Fields>> {
    let row = sqlx::query("SELECT fields FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => {
            let raw: String = row.get("fields");
            Ok(Some(parse_fields(collection, id, &raw)?))
        }
        None => Ok(None),
    }
}

async fn write_fields(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
    fields: &Fields,
) -> Result<()> {
    let json = serde_json::to_string(fields)?;
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, fields, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            fields = excluded.fields,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(&json)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn delete_row(conn: &mut SqliteConnection, collection: &str, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn apply_op(conn: &mut SqliteConnection, op: &WriteOp) -> Result<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            fields,
        } => write_fields(conn, collection, id, fields).await,
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let mut doc = read_fields(conn, collection, id).await?.unwrap_or_default();
            merge_fields(&mut doc, fields);
            write_fields(conn, collection, id, &doc).await
        }
        WriteOp::Delete { collection, id } => delete_row(conn, collection, id).await,
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let mut conn = self.pool.acquire().await?;
        read_fields(&mut conn, collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_fields(&mut conn, collection, id, &fields).await
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.commit(&[WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }])
        .await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        delete_row(&mut conn, collection, id).await
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>> {
        let rows = sqlx::query("SELECT id, fields FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let raw: String = row.get("fields");
                let fields = parse_fields(collection, &id, &raw)?;
                Ok(DocumentSnapshot { id, fields })
            })
            .collect()
    }

    async fn remove_array_value(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let mut removed = false;
        if let Some(mut doc) = read_fields(&mut tx, collection, id).await? {
            if remove_first_array_value(&mut doc, field, value) {
                write_fields(&mut tx, collection, id, &doc).await?;
                removed = true;
            }
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn commit(&self, ops: &[WriteOp]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for op in ops {
            apply_op(&mut tx, op)
                .await
                .with_context(|| format!("batch write to {}/{} failed", op.collection(), op.id()))?;
        }
        tx.commit().await?;
        Ok(())
    }
}
