//! Store doubles for repository tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::memory::MemoryStore;
use super::{DocumentSnapshot, DocumentStore, Fields, WriteOp};

/// Serves reads from the wrapped store and fails every write.
pub(crate) struct ReadOnlyStore(pub MemoryStore);

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        self.0.get_document(collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, _fields: Fields) -> Result<()> {
        bail!("write to {}/{} rejected", collection, id)
    }

    async fn update_document(&self, collection: &str, id: &str, _fields: Fields) -> Result<()> {
        bail!("write to {}/{} rejected", collection, id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        bail!("delete of {}/{} rejected", collection, id)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>> {
        self.0.list_documents(collection).await
    }

    async fn remove_array_value(
        &self,
        collection: &str,
        id: &str,
        _field: &str,
        _value: &Value,
    ) -> Result<bool> {
        bail!("write to {}/{} rejected", collection, id)
    }

    async fn commit(&self, _ops: &[WriteOp]) -> Result<()> {
        bail!("batch rejected")
    }
}
