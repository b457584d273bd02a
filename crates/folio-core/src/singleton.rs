//! Singleton profile documents.
//!
//! Hero, about and publication statistics are one document each, written
//! by whole-document overwrite.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FolioError, Result};
use crate::store::DocumentStore;

/// A document type stored at a fixed `(collection, id)`.
pub trait SingletonDoc: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const DOCUMENT: &'static str;
}

pub struct Singleton<T> {
    store: Arc<dyn DocumentStore>,
    _doc: PhantomData<fn() -> T>,
}

impl<T: SingletonDoc> Singleton<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _doc: PhantomData,
        }
    }

    pub async fn load(&self) -> Result<Option<T>> {
        match self.store.get_document(T::COLLECTION, T::DOCUMENT).await? {
            Some(fields) => serde_json::from_value(Value::Object(fields))
                .map(Some)
                .map_err(|e| FolioError::decode(location::<T>(), e)),
            None => Ok(None),
        }
    }

    /// Overwrite the document with `doc`.
    pub async fn save(&self, doc: &T) -> Result<()> {
        let value = serde_json::to_value(doc).map_err(|e| FolioError::decode(location::<T>(), e))?;
        let Value::Object(fields) = value else {
            return Err(FolioError::InvalidInput(format!(
                "{} must be a JSON object",
                location::<T>()
            )));
        };
        self.store
            .set_document(T::COLLECTION, T::DOCUMENT, fields)
            .await?;
        Ok(())
    }
}

fn location<T: SingletonDoc>() -> String {
    format!("{}/{}", T::COLLECTION, T::DOCUMENT)
}

/// Landing-page header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hero {
    pub name: String,
    pub title: String,
    pub affiliation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
}

impl SingletonDoc for Hero {
    const COLLECTION: &'static str = "portfolio";
    const DOCUMENT: &'static str = "hero";
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    pub paragraphs: Vec<String>,
    pub research_interests: Vec<String>,
}

impl SingletonDoc for About {
    const COLLECTION: &'static str = "portfolio";
    const DOCUMENT: &'static str = "about";
}

/// Counts shown in the publications summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationStats {
    pub journal_articles: usize,
    pub conference_proceedings: usize,
    pub edited_books: usize,
    pub book_chapters: usize,
    pub total: usize,
    pub first_author: usize,
    pub corresponding_author: usize,
    pub citations: u64,
    /// RFC 3339 time of the last recomputation.
    pub updated_at: String,
}

impl SingletonDoc for PublicationStats {
    const COLLECTION: &'static str = "portfolio";
    const DOCUMENT: &'static str = "publication_stats";
}
