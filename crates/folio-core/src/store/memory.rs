//! In-memory [`DocumentStore`] implementation for tests and previews.
//!
//! Collections are `BTreeMap`s behind a single `std::sync::RwLock`, so a
//! [`commit`](DocumentStore::commit) batch is applied under one write
//! guard and is trivially atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{
    merge_fields, remove_first_array_value, DocumentSnapshot, DocumentStore, Fields, WriteOp,
};

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// In-memory document store.
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents currently held in `collection`.
    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(collections: &mut Collections, op: &WriteOp) {
    match op {
        WriteOp::Set {
            collection,
            id,
            fields,
        } => {
            collections
                .entry(collection.clone())
                .or_default()
                .insert(id.clone(), fields.clone());
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let doc = collections
                .entry(collection.clone())
                .or_default()
                .entry(id.clone())
                .or_default();
            merge_fields(doc, fields);
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(collection) {
                docs.remove(id);
                if docs.is_empty() {
                    collections.remove(collection);
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let collections = self.read()?;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.write()?;
        apply(
            &mut collections,
            &WriteOp::Set {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        );
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut collections = self.write()?;
        apply(
            &mut collections,
            &WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                fields,
            },
        );
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.write()?;
        apply(
            &mut collections,
            &WriteOp::Delete {
                collection: collection.to_string(),
                id: id.to_string(),
            },
        );
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSnapshot>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| DocumentSnapshot {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn remove_array_value(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &Value,
    ) -> Result<bool> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .is_some_and(|doc| remove_first_array_value(doc, field, value)))
    }

    async fn commit(&self, ops: &[WriteOp]) -> Result<()> {
        let mut collections = self.write()?;
        for op in ops {
            apply(&mut collections, op);
        }
        Ok(())
    }
}
