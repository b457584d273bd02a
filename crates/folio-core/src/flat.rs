//! Flat-list sections (skills, education, awards, ...).
//!
//! One fixed document per section holds a single `items` array. The
//! document may not exist yet, which reads as an empty list. Writes replace
//! the whole array through a merge-update, so the first write creates the
//! document. New items are appended.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{FolioError, Result};
use crate::models::{ListLayout, ListRecord};
use crate::store::{DocumentStore, Fields};

pub struct FlatList<R> {
    store: Arc<dyn DocumentStore>,
    layout: ListLayout,
    _kind: PhantomData<fn() -> R>,
}

impl<R: ListRecord> FlatList<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_layout(store, R::LAYOUT)
    }

    pub fn with_layout(store: Arc<dyn DocumentStore>, layout: ListLayout) -> Self {
        Self {
            store,
            layout,
            _kind: PhantomData,
        }
    }

    pub fn layout(&self) -> ListLayout {
        self.layout
    }

    /// Current items, empty if the document does not exist.
    pub async fn load(&self) -> Result<Vec<R>> {
        match self.stored_array().await? {
            None => Ok(Vec::new()),
            Some(value) => {
                serde_json::from_value(value).map_err(|e| FolioError::decode(self.location(), e))
            }
        }
    }

    /// Current items exactly as stored. Fails like [`load`](Self::load) if
    /// any item does not decode as `R`.
    pub async fn load_raw(&self) -> Result<Vec<Value>> {
        let Some(value) = self.stored_array().await? else {
            return Ok(Vec::new());
        };
        serde_json::from_value::<Vec<R>>(value.clone())
            .map_err(|e| FolioError::decode(self.location(), e))?;
        match value {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Append `record` and return its index.
    pub async fn add(&self, mut record: R) -> Result<usize> {
        record.ensure_id();
        record.validate()?;
        let mut items = self.load().await?;
        items.push(record);
        self.write(&items).await?;
        debug!(list = %self.location(), len = items.len(), "item added");
        Ok(items.len() - 1)
    }

    /// Replace the item at `index`. A blank id inherits the replaced item's id.
    pub async fn update_at(&self, index: usize, mut record: R) -> Result<()> {
        let mut items = self.load().await?;
        let previous = items.get(index).ok_or_else(|| {
            FolioError::NotFound(format!("{} has no item at index {}", self.location(), index))
        })?;
        if record.id().is_empty() {
            record.set_id(previous.id().to_string());
        }
        record.ensure_id();
        record.validate()?;
        items[index] = record;
        self.write(&items).await?;
        debug!(list = %self.location(), index, "item updated");
        Ok(())
    }

    /// Remove the first item structurally equal to `record`.
    ///
    /// When duplicates exist, which one goes is the store's first match.
    /// Fails with [`FolioError::NotFound`] when no item matches.
    pub async fn remove_by_value(&self, record: &R) -> Result<()> {
        let value = serde_json::to_value(record).map_err(|e| FolioError::decode(self.location(), e))?;
        self.remove_value(&value).await
    }

    /// Remove the first stored item equal to `value`, compared as raw JSON
    /// so items carrying nulls or unmodeled fields still match what
    /// [`load_raw`](Self::load_raw) returned.
    pub async fn remove_value(&self, value: &Value) -> Result<()> {
        let removed = self
            .store
            .remove_array_value(
                self.layout.collection,
                self.layout.document,
                self.layout.field,
                value,
            )
            .await?;
        if !removed {
            return Err(FolioError::NotFound(format!(
                "{} has no matching item",
                self.location()
            )));
        }
        debug!(list = %self.location(), "item removed by value");
        Ok(())
    }

    /// Remove the item carrying stable id `id` and return it.
    pub async fn remove_by_id(&self, id: &str) -> Result<R> {
        let mut items = self.load().await?;
        let pos = items
            .iter()
            .position(|item| !id.is_empty() && item.id() == id)
            .ok_or_else(|| FolioError::NotFound(format!("{} item {}", self.location(), id)))?;
        let removed = items.remove(pos);
        self.write(&items).await?;
        debug!(list = %self.location(), %id, "item removed");
        Ok(removed)
    }

    async fn write(&self, items: &[R]) -> Result<()> {
        let value = serde_json::to_value(items).map_err(|e| FolioError::decode(self.location(), e))?;
        let mut fields = Fields::new();
        fields.insert(self.layout.field.to_string(), value);
        self.store
            .update_document(self.layout.collection, self.layout.document, fields)
            .await?;
        Ok(())
    }

    async fn stored_array(&self) -> Result<Option<Value>> {
        let fields = self
            .store
            .get_document(self.layout.collection, self.layout.document)
            .await?;
        Ok(fields
            .and_then(|mut f| f.remove(self.layout.field))
            .filter(|value| !value.is_null()))
    }

    fn location(&self) -> String {
        format!(
            "{}/{}.{}",
            self.layout.collection, self.layout.document, self.layout.field
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Award, Skill};
    use crate::store::memory::MemoryStore;
    use crate::store::testing::ReadOnlyStore;
    use serde_json::json;

    async fn seed(store: &MemoryStore, document: &str, fields: Value) {
        store
            .set_document("portfolio", document, fields.as_object().unwrap().clone())
            .await
            .unwrap();
    }

    fn skill(name: &str) -> Skill {
        Skill {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_document_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        assert!(list.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_appends_and_creates_document() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store.clone());
        assert_eq!(list.add(skill("Rust")).await.unwrap(), 0);
        assert_eq!(list.add(skill("SQL")).await.unwrap(), 1);

        let names: Vec<String> = list.load().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Rust", "SQL"]);
        assert!(store.get_document("portfolio", "skills").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn add_then_remove_by_value() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        list.add(skill("Rust")).await.unwrap();
        list.add(skill("Statistics")).await.unwrap();

        let items = list.load().await.unwrap();
        let rust = items.iter().find(|s| s.name == "Rust").unwrap().clone();
        list.remove_by_value(&rust).await.unwrap();

        let items = list.load().await.unwrap();
        assert!(!items.contains(&rust));
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn remove_by_value_takes_first_of_legacy_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let fields = json!({"items": [
            {"title": "Best Paper", "year": "2020"},
            {"title": "Best Paper", "year": "2020"}
        ]});
        store
            .set_document("portfolio", "awards", fields.as_object().unwrap().clone())
            .await
            .unwrap();
        let list = FlatList::<Award>::new(store);

        let dup = list.load().await.unwrap()[0].clone();
        list.remove_by_value(&dup).await.unwrap();
        assert_eq!(list.load().await.unwrap(), vec![dup]);
    }

    #[tokio::test]
    async fn remove_value_matches_items_with_unmodeled_fields() {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            "skills",
            json!({"items": [
                {"name": "Rust", "icon": "rust.svg", "category": null},
                {"name": "Go"}
            ]}),
        )
        .await;
        let list = FlatList::<Skill>::new(store);

        let raw = list.load_raw().await.unwrap();
        assert_eq!(raw[0]["icon"], "rust.svg");
        list.remove_value(&raw[0]).await.unwrap();

        assert_eq!(list.load_raw().await.unwrap(), vec![json!({"name": "Go"})]);
    }

    #[tokio::test]
    async fn remove_without_match_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        let err = list.remove_by_value(&skill("Rust")).await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));

        list.add(skill("Go")).await.unwrap();
        let err = list.remove_value(&json!({"name": "Rust"})).await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));
        assert_eq!(list.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_keeps_unmodeled_fields_of_existing_items() {
        let store = Arc::new(MemoryStore::new());
        let legacy = json!({"name": "Rust", "icon": "rust.svg"});
        seed(&store, "skills", json!({"items": [legacy.clone()]})).await;
        let list = FlatList::<Skill>::new(store);

        list.add(skill("Go")).await.unwrap();
        assert_eq!(list.load_raw().await.unwrap()[0], legacy);
    }

    #[tokio::test]
    async fn failed_add_reports_store_error_and_writes_nothing() {
        let seeded = MemoryStore::new();
        seed(&seeded, "skills", json!({"items": [{"name": "Rust"}]})).await;
        let list = FlatList::<Skill>::new(Arc::new(ReadOnlyStore(seeded)));

        let err = list.add(skill("Go")).await.unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));
        let names: Vec<String> = list.load().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Rust"]);
    }

    #[tokio::test]
    async fn update_at_keeps_id() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        list.add(skill("Rust")).await.unwrap();
        let original_id = list.load().await.unwrap()[0].id.clone();

        let mut edited = skill("Rust");
        edited.level = Some(5);
        list.update_at(0, edited).await.unwrap();

        let items = list.load().await.unwrap();
        assert_eq!(items[0].id, original_id);
        assert_eq!(items[0].level, Some(5));

        let err = list.update_at(7, skill("x")).await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_by_id() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        list.add(skill("Rust")).await.unwrap();
        list.add(skill("Rust")).await.unwrap();
        let second = list.load().await.unwrap()[1].clone();

        let removed = list.remove_by_id(&second.id).await.unwrap();
        assert_eq!(removed, second);
        let items = list.load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_ne!(items[0].id, second.id);
    }

    #[tokio::test]
    async fn blank_required_field_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let list = FlatList::<Skill>::new(store);
        let err = list.add(skill(" ")).await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidRecord { .. }));
    }
}
