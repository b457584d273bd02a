//! Document store abstraction for Folio.
//!
//! The [`DocumentStore`] trait is the only external boundary of the
//! repositories: a schemaless database addressed by `(collection, id)`
//! where every document is a JSON object ([`Fields`]).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Top-level field map of one document.
pub type Fields = Map<String, Value>;

/// A document as returned by [`DocumentStore::list_documents`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub fields: Fields,
}

/// A single write inside an atomic [`DocumentStore::commit`] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Overwrite (or create) the whole document.
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge top-level fields into the document, creating it if absent.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Delete the document. Deleting a missing document is not an error.
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Set { id, .. } | WriteOp::Update { id, .. } | WriteOp::Delete { id, .. } => id,
        }
    }
}

/// Merge `patch` into `base` the way [`WriteOp::Update`] does: top-level
/// keys in `patch` replace the ones in `base`, everything else is kept.
pub fn merge_fields(base: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// Remove the first element of `fields[field]` equal to `value`.
///
/// Returns `true` if an element was removed. A missing field, or a field
/// that is not an array, is left untouched.
pub fn remove_first_array_value(fields: &mut Fields, field: &str, value: &Value) -> bool {
    let Some(Value::Array(items)) = fields.get_mut(field) else {
        return false;
    };
    match items.iter().position(|item| item == value) {
        Some(pos) => {
            items.remove(pos);
            true
        }
        None => false,
    }
}

/// Abstract document database backing every repository.
///
/// All operations are async (via `async-trait`) so that remote and local
/// backends share one contract. No operation retries on its own; a failure
/// is reported once to the caller.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_document`](DocumentStore::get_document) | Read one document, `None` if absent |
/// | [`set_document`](DocumentStore::set_document) | Create or overwrite a document |
/// | [`update_document`](DocumentStore::update_document) | Merge fields, creating if absent |
/// | [`delete_document`](DocumentStore::delete_document) | Delete a document |
/// | [`list_documents`](DocumentStore::list_documents) | Every document in a collection |
/// | [`remove_array_value`](DocumentStore::remove_array_value) | Drop the first equal array element |
/// | [`commit`](DocumentStore::commit) | Apply several writes atomically |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>>;

    /// Create the document or replace all of its fields.
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Merge top-level fields into the document, creating it when absent.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Delete the document if it exists.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;

    /// List every document of a collection, ordered by id.
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>>;

    /// Remove the first element of the array `field` that is structurally
    /// equal to `value`, returning whether one was removed. A missing
    /// document or field removes nothing.
    async fn remove_array_value(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool>;

    /// Apply all `ops` in order as one all-or-nothing unit.
    async fn commit(&self, ops: &[WriteOp]) -> Result<()>;
}
