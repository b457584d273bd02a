//! Year-bucketed record storage.
//!
//! A [`YearBuckets`] repository keeps the `{year → [record]}` mapping of
//! one publication kind. Each year is one document (id = the year string)
//! in the kind's collection, holding one array field.
//!
//! # Invariants
//!
//! - A bucket document exists iff its array is non-empty: the first insert
//!   creates it, and removing the last record deletes it.
//! - Within a collection, document ids are unique years.
//!
//! # Ordering
//!
//! New records are always appended to the end of their bucket. The
//! repository makes no promise about the order of years; callers that
//! render use [`years_descending`].
//!
//! # Concurrency
//!
//! Every mutation is a read-modify-write of the whole array with no version
//! check. Two writers touching the same bucket race and the last write
//! wins. Moving a record to another year is the only multi-document write
//! and goes through one atomic [`DocumentStore::commit`].

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FolioError, Result};
use crate::models::{BucketLayout, Record, YearRecord};
use crate::store::{DocumentStore, Fields, WriteOp};

/// A record together with its position in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tagged<R> {
    /// Bucket the record was read from.
    pub year: String,
    /// Index within that bucket's array.
    pub index: usize,
    pub record: R,
}

/// All records of one kind, keyed by year.
pub type YearMap<R> = BTreeMap<String, Vec<Tagged<R>>>;

/// Repository over the year buckets of one record kind.
pub struct YearBuckets<R> {
    store: Arc<dyn DocumentStore>,
    layout: BucketLayout,
    _kind: PhantomData<fn() -> R>,
}

impl<R: YearRecord> YearBuckets<R> {
    /// Repository using the kind's default layout.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_layout(store, R::LAYOUT)
    }

    pub fn with_layout(store: Arc<dyn DocumentStore>, layout: BucketLayout) -> Self {
        Self {
            store,
            layout,
            _kind: PhantomData,
        }
    }

    pub fn layout(&self) -> BucketLayout {
        self.layout
    }

    /// Read every bucket of the collection, tagging each record with its
    /// year and index. An empty collection yields an empty map.
    pub async fn load_all(&self) -> Result<YearMap<R>> {
        let docs = self.store.list_documents(self.layout.collection).await?;
        let mut all = BTreeMap::new();
        for doc in docs {
            let records: Vec<R> = decode_array(&doc.fields, self.layout, &doc.id)?;
            let tagged = records
                .into_iter()
                .enumerate()
                .map(|(index, record)| Tagged {
                    year: doc.id.clone(),
                    index,
                    record,
                })
                .collect();
            all.insert(doc.id, tagged);
        }
        Ok(all)
    }

    /// Records of one year, `None` if the bucket does not exist.
    pub async fn load_bucket(&self, year: &str) -> Result<Option<Vec<R>>> {
        match self.store.get_document(self.layout.collection, year).await? {
            Some(fields) => Ok(Some(decode_array(&fields, self.layout, year)?)),
            None => Ok(None),
        }
    }

    /// Append `record` to the bucket of `year`, creating the bucket if it
    /// does not exist yet.
    ///
    /// The record's own `year` is set to the bucket key and a stable id is
    /// assigned if it has none.
    pub async fn add(&self, year: &str, mut record: R) -> Result<Tagged<R>> {
        let year = normalize_year(year)?;
        record.set_year(year.clone());
        record.ensure_id();
        record.validate()?;

        let index = match self.load_bucket(&year).await? {
            Some(mut records) => {
                records.push(record.clone());
                let fields = encode_array(self.layout, &records)?;
                self.store
                    .update_document(self.layout.collection, &year, fields)
                    .await?;
                records.len() - 1
            }
            None => {
                let fields = encode_array(self.layout, std::slice::from_ref(&record))?;
                self.store
                    .set_document(self.layout.collection, &year, fields)
                    .await?;
                0
            }
        };

        debug!(collection = self.layout.collection, %year, index, "record added");
        Ok(Tagged {
            year,
            index,
            record,
        })
    }

    /// Replace the record at `(year, index)`.
    ///
    /// If `record.year()` names a different year the record moves: it is
    /// spliced out of the original bucket (which is deleted if that empties
    /// it) and appended to the destination bucket (created if absent). Both
    /// writes are committed as one atomic batch.
    ///
    /// A blank `record.year()` keeps the original year; a blank id inherits
    /// the id of the record being replaced.
    pub async fn update(&self, year: &str, index: usize, mut record: R) -> Result<Tagged<R>> {
        let year = normalize_year(year)?;
        let mut source = self.existing_bucket(&year).await?;
        let previous = source.get(index).ok_or_else(|| self.position_error(&year, index))?;

        if record.id().is_empty() {
            record.set_id(previous.id().to_string());
        }
        record.ensure_id();
        let target = if record.year().trim().is_empty() {
            year.clone()
        } else {
            normalize_year(record.year())?
        };
        record.set_year(target.clone());
        record.validate()?;

        if target == year {
            source[index] = record.clone();
            let fields = encode_array(self.layout, &source)?;
            self.store
                .update_document(self.layout.collection, &year, fields)
                .await?;
            debug!(collection = self.layout.collection, %year, index, "record updated");
            return Ok(Tagged {
                year,
                index,
                record,
            });
        }

        source.remove(index);
        let mut ops = vec![self.rewrite_op(&year, &source)?];

        let (dest_op, dest_index) = match self.load_bucket(&target).await? {
            Some(mut dest) => {
                dest.push(record.clone());
                let op = WriteOp::Update {
                    collection: self.layout.collection.to_string(),
                    id: target.clone(),
                    fields: encode_array(self.layout, &dest)?,
                };
                (op, dest.len() - 1)
            }
            None => {
                let op = WriteOp::Set {
                    collection: self.layout.collection.to_string(),
                    id: target.clone(),
                    fields: encode_array(self.layout, std::slice::from_ref(&record))?,
                };
                (op, 0)
            }
        };
        ops.push(dest_op);

        self.store.commit(&ops).await?;
        debug!(
            collection = self.layout.collection,
            from = %year,
            to = %target,
            "record moved"
        );
        Ok(Tagged {
            year: target,
            index: dest_index,
            record,
        })
    }

    /// Remove the record at `(year, index)` and return it. Removing the
    /// last record of a year deletes the bucket document.
    pub async fn remove(&self, year: &str, index: usize) -> Result<R> {
        let year = normalize_year(year)?;
        let mut records = self.existing_bucket(&year).await?;
        if index >= records.len() {
            return Err(self.position_error(&year, index));
        }
        let removed = records.remove(index);

        if records.is_empty() {
            self.store
                .delete_document(self.layout.collection, &year)
                .await?;
            debug!(collection = self.layout.collection, %year, "bucket emptied and deleted");
        } else {
            let fields = encode_array(self.layout, &records)?;
            self.store
                .update_document(self.layout.collection, &year, fields)
                .await?;
            debug!(collection = self.layout.collection, %year, index, "record removed");
        }
        Ok(removed)
    }

    /// Locate a record by its stable id.
    pub async fn find(&self, id: &str) -> Result<Option<Tagged<R>>> {
        if id.is_empty() {
            return Ok(None);
        }
        let all = self.load_all().await?;
        Ok(all
            .into_values()
            .flatten()
            .find(|tagged| tagged.record.id() == id))
    }

    /// [`update`](Self::update) addressed by stable id.
    pub async fn update_by_id(&self, id: &str, mut record: R) -> Result<Tagged<R>> {
        let found = self
            .find(id)
            .await?
            .ok_or_else(|| FolioError::NotFound(format!("{} record {}", self.layout.collection, id)))?;
        record.set_id(id.to_string());
        self.update(&found.year, found.index, record).await
    }

    /// [`remove`](Self::remove) addressed by stable id.
    pub async fn remove_by_id(&self, id: &str) -> Result<R> {
        let found = self
            .find(id)
            .await?
            .ok_or_else(|| FolioError::NotFound(format!("{} record {}", self.layout.collection, id)))?;
        self.remove(&found.year, found.index).await
    }

    async fn existing_bucket(&self, year: &str) -> Result<Vec<R>> {
        self.load_bucket(year).await?.ok_or_else(|| {
            FolioError::NotFound(format!("{}/{}", self.layout.collection, year))
        })
    }

    /// Write-back for a bucket that just lost a record.
    fn rewrite_op(&self, year: &str, records: &[R]) -> Result<WriteOp> {
        if records.is_empty() {
            Ok(WriteOp::Delete {
                collection: self.layout.collection.to_string(),
                id: year.to_string(),
            })
        } else {
            Ok(WriteOp::Update {
                collection: self.layout.collection.to_string(),
                id: year.to_string(),
                fields: encode_array(self.layout, records)?,
            })
        }
    }

    fn position_error(&self, year: &str, index: usize) -> FolioError {
        FolioError::NotFound(format!(
            "{}/{} has no record at index {}",
            self.layout.collection, year, index
        ))
    }
}

/// Years of `all` in rendering order, newest first.
///
/// Plain string comparison, which orders 4-digit years numerically.
pub fn years_descending<R>(all: &YearMap<R>) -> Vec<&str> {
    all.keys().rev().map(String::as_str).collect()
}

/// Trim a year key and reject blank ones.
pub fn normalize_year(year: &str) -> Result<String> {
    let year = year.trim();
    if year.is_empty() {
        return Err(FolioError::InvalidInput("year must not be empty".into()));
    }
    if year.contains('/') {
        return Err(FolioError::InvalidInput(format!(
            "year must not contain '/': {}",
            year
        )));
    }
    Ok(year.to_string())
}

pub(crate) fn decode_array<R: Record>(
    fields: &Fields,
    layout: BucketLayout,
    year: &str,
) -> Result<Vec<R>> {
    match fields.get(layout.field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            FolioError::decode(format!("{}/{}.{}", layout.collection, year, layout.field), e)
        }),
    }
}

fn encode_array<R: Record>(layout: BucketLayout, records: &[R]) -> Result<Fields> {
    let value = serde_json::to_value(records)
        .map_err(|e| FolioError::decode(format!("{}.{}", layout.collection, layout.field), e))?;
    let mut fields = Fields::new();
    fields.insert(layout.field.to_string(), value);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookChapter, ConferenceProceeding, JournalArticle};
    use crate::store::memory::MemoryStore;
    use crate::store::testing::ReadOnlyStore;
    use crate::store::DocumentSnapshot;
    use async_trait::async_trait;
    use serde_json::json;

    fn article(title: &str, year: &str) -> JournalArticle {
        JournalArticle {
            title: title.into(),
            authors: "X".into(),
            journal: "J".into(),
            year: year.into(),
            ..Default::default()
        }
    }

    fn proceeding(title: &str, year: &str) -> ConferenceProceeding {
        ConferenceProceeding {
            title: title.into(),
            authors: "X".into(),
            conference: "C".into(),
            year: year.into(),
            ..Default::default()
        }
    }

    fn titles<R: YearRecord>(all: &YearMap<R>, year: &str, title: fn(&R) -> String) -> Vec<String> {
        all.get(year)
            .map(|v| v.iter().map(|t| title(&t.record)).collect())
            .unwrap_or_default()
    }

    async fn assert_bucket_invariant(store: &MemoryStore, layout: BucketLayout) {
        for doc in store.list_documents(layout.collection).await.unwrap() {
            let len = doc.fields[layout.field].as_array().map_or(0, Vec::len);
            assert!(len > 0, "bucket {} exists but is empty", doc.id);
        }
    }

    #[tokio::test]
    async fn add_creates_then_appends() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store.clone());

        let first = repo.add("2023", article("A", "2023")).await.unwrap();
        assert_eq!(first.index, 0);
        let doc = store
            .get_document("journal_articles", "2023")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["articles"][0]["title"], "A");

        let second = repo.add("2023", article("B", "2023")).await.unwrap();
        assert_eq!(second.index, 1);

        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2023", |a| a.title.clone()), vec!["A", "B"]);
        assert_ne!(first.record.id, second.record.id);
    }

    #[tokio::test]
    async fn add_normalizes_record_year_to_bucket() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store);

        let tagged = repo.add(" 2021 ", article("A", "")).await.unwrap();
        assert_eq!(tagged.year, "2021");
        assert_eq!(tagged.record.year, "2021");
    }

    #[tokio::test]
    async fn add_rejects_missing_required_fields() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store.clone());

        let mut bad = article("A", "2023");
        bad.journal.clear();
        let err = repo.add("2023", bad).await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidRecord { .. }));
        assert_eq!(store.document_count("journal_articles"), 0);
    }

    #[tokio::test]
    async fn removing_only_record_deletes_bucket() {
        let store = Arc::new(MemoryStore::new());
        let fields = json!({"chapters": [{
            "title": "Only Chapter",
            "authors": "X",
            "book_title": "B",
            "year": "2022"
        }]});
        store
            .set_document("book_chapters", "2022", fields.as_object().unwrap().clone())
            .await
            .unwrap();

        let repo = YearBuckets::<BookChapter>::new(store.clone());
        let removed = repo.remove("2022", 0).await.unwrap();
        assert_eq!(removed.title, "Only Chapter");
        assert!(store
            .get_document("book_chapters", "2022")
            .await
            .unwrap()
            .is_none());
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_keeps_relative_order() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store);
        for title in ["A", "B", "C", "D"] {
            repo.add("2020", article(title, "2020")).await.unwrap();
        }

        repo.remove("2020", 1).await.unwrap();
        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2020", |a| a.title.clone()), vec!["A", "C", "D"]);
        let indices: Vec<usize> = all["2020"].iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn update_in_place() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store);
        let original = repo.add("2023", article("A", "2023")).await.unwrap();
        repo.add("2023", article("B", "2023")).await.unwrap();

        let mut edited = article("A (revised)", "2023");
        edited.citations = Some(12);
        let updated = repo.update("2023", 0, edited).await.unwrap();
        assert_eq!(updated.index, 0);
        assert_eq!(updated.record.id, original.record.id);

        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2023", |a| a.title.clone()), vec!["A (revised)", "B"]);
        assert_eq!(all["2023"][0].record.citations, Some(12));
    }

    #[tokio::test]
    async fn update_moves_record_to_new_year() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<ConferenceProceeding>::new(store.clone());
        repo.add("2024", proceeding("First", "2024")).await.unwrap();
        repo.add("2024", proceeding("Second", "2024")).await.unwrap();

        let moved = repo
            .update("2024", 0, proceeding("First", "2025"))
            .await
            .unwrap();
        assert_eq!(moved.year, "2025");
        assert_eq!(moved.index, 0);

        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2024", |p| p.title.clone()), vec!["Second"]);
        assert_eq!(titles(&all, "2025", |p| p.title.clone()), vec!["First"]);
        let doc = store
            .get_document("conference_proceedings", "2025")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["proceedings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn moving_last_record_deletes_source_bucket() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store.clone());
        repo.add("2019", article("Lonely", "2019")).await.unwrap();
        repo.add("2020", article("Existing", "2020")).await.unwrap();

        let moved = repo.update("2019", 0, article("Lonely", "2020")).await.unwrap();
        assert_eq!(moved.index, 1);
        assert!(store
            .get_document("journal_articles", "2019")
            .await
            .unwrap()
            .is_none());
        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2020", |a| a.title.clone()), vec!["Existing", "Lonely"]);
        assert_bucket_invariant(&store, JournalArticle::LAYOUT).await;
    }

    #[tokio::test]
    async fn update_out_of_range_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store);
        repo.add("2023", article("A", "2023")).await.unwrap();

        let err = repo.update("2023", 3, article("Z", "2023")).await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));
        let err = repo.remove("1999", 0).await.unwrap_err();
        assert!(matches!(err, FolioError::NotFound(_)));
    }

    #[tokio::test]
    async fn id_addressed_operations() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store);
        let a = repo.add("2023", article("Same", "2023")).await.unwrap();
        let b = repo.add("2023", article("Same", "2023")).await.unwrap();

        // Textually identical records stay distinguishable by id.
        let removed = repo.remove_by_id(&b.record.id).await.unwrap();
        assert_eq!(removed.id, b.record.id);
        let remaining = repo.find(&a.record.id).await.unwrap().unwrap();
        assert_eq!(remaining.index, 0);

        let moved = repo
            .update_by_id(&a.record.id, article("Same", "2018"))
            .await
            .unwrap();
        assert_eq!(moved.year, "2018");
        assert_eq!(moved.record.id, a.record.id);
        assert!(repo.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_all_on_empty_collection_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<BookChapter>::new(store);
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_all_is_idempotent_and_defaults_missing_field() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_document("journal_articles", "2010", Fields::new())
            .await
            .unwrap();
        let repo = YearBuckets::<JournalArticle>::new(store);
        repo.add("2023", article("A", "2023")).await.unwrap();

        let first = repo.load_all().await.unwrap();
        let second = repo.load_all().await.unwrap();
        assert_eq!(first, second);
        assert!(first["2010"].is_empty());
        assert_eq!(years_descending(&first), vec!["2023", "2010"]);
    }

    #[tokio::test]
    async fn bucket_invariant_holds_over_mixed_operations() {
        let store = Arc::new(MemoryStore::new());
        let repo = YearBuckets::<JournalArticle>::new(store.clone());
        repo.add("2020", article("a", "2020")).await.unwrap();
        repo.add("2021", article("b", "2021")).await.unwrap();
        repo.add("2021", article("c", "2021")).await.unwrap();
        repo.update("2020", 0, article("a", "2021")).await.unwrap();
        repo.remove("2021", 0).await.unwrap();
        repo.update("2021", 1, article("a", "2022")).await.unwrap();
        repo.remove("2021", 0).await.unwrap();

        assert_bucket_invariant(&store, JournalArticle::LAYOUT).await;
        let all = repo.load_all().await.unwrap();
        assert_eq!(years_descending(&all), vec!["2022"]);
    }

    #[tokio::test]
    async fn add_keeps_unmodeled_fields_of_neighbours() {
        let store = Arc::new(MemoryStore::new());
        let legacy = json!({
            "title": "A",
            "authors": "X",
            "journal": "J",
            "year": "2023",
            "abstract": "keep me"
        });
        store
            .set_document(
                "journal_articles",
                "2023",
                json!({"articles": [legacy.clone()]}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();

        let repo = YearBuckets::<JournalArticle>::new(store.clone());
        repo.add("2023", article("B", "2023")).await.unwrap();

        let doc = store
            .get_document("journal_articles", "2023")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["articles"][0], legacy);
        assert!(doc["articles"][1].get("is_first_author").is_none());
    }

    #[tokio::test]
    async fn failed_add_reports_store_error_and_writes_nothing() {
        let seeded = MemoryStore::new();
        seeded
            .set_document(
                "journal_articles",
                "2023",
                json!({"articles": [{"title": "A", "authors": "X", "journal": "J", "year": "2023"}]})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await
            .unwrap();
        let repo = YearBuckets::<JournalArticle>::new(Arc::new(ReadOnlyStore(seeded)));

        let err = repo.add("2023", article("B", "2023")).await.unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));
        let err = repo.add("2024", article("C", "2024")).await.unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));

        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2023", |a| a.title.clone()), vec!["A"]);
        assert!(!all.contains_key("2024"));
    }

    /// Store whose batch commits always fail.
    struct FailingCommit(MemoryStore);

    #[async_trait]
    impl DocumentStore for FailingCommit {
        async fn get_document(&self, c: &str, id: &str) -> anyhow::Result<Option<Fields>> {
            self.0.get_document(c, id).await
        }
        async fn set_document(&self, c: &str, id: &str, f: Fields) -> anyhow::Result<()> {
            self.0.set_document(c, id, f).await
        }
        async fn update_document(&self, c: &str, id: &str, f: Fields) -> anyhow::Result<()> {
            self.0.update_document(c, id, f).await
        }
        async fn delete_document(&self, c: &str, id: &str) -> anyhow::Result<()> {
            self.0.delete_document(c, id).await
        }
        async fn list_documents(&self, c: &str) -> anyhow::Result<Vec<DocumentSnapshot>> {
            self.0.list_documents(c).await
        }
        async fn remove_array_value(
            &self,
            c: &str,
            id: &str,
            field: &str,
            value: &Value,
        ) -> anyhow::Result<bool> {
            self.0.remove_array_value(c, id, field, value).await
        }
        async fn commit(&self, _ops: &[WriteOp]) -> anyhow::Result<()> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[tokio::test]
    async fn failed_move_leaves_source_untouched() {
        let store = Arc::new(FailingCommit(MemoryStore::new()));
        let repo = YearBuckets::<JournalArticle>::new(store);
        repo.add("2024", article("A", "2024")).await.unwrap();

        let err = repo.update("2024", 0, article("A", "2025")).await.unwrap_err();
        assert!(matches!(err, FolioError::Store(_)));

        let all = repo.load_all().await.unwrap();
        assert_eq!(titles(&all, "2024", |a| a.title.clone()), vec!["A"]);
        assert!(!all.contains_key("2025"));
    }
}
