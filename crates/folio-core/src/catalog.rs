//! Name-addressed access to every portfolio section.
//!
//! The CLI and the HTTP API address kinds by name and exchange records as
//! JSON. [`Catalog`] maps a [`PublicationKind`], [`Section`] or
//! [`ProfileDoc`] onto the typed repository for that kind, so each
//! operation is written once and instantiated per record type.
//!
//! Every mutating method takes an [`Editor`]; reads are public.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::access::Editor;
use crate::buckets::{Tagged, YearBuckets};
use crate::check::{check_buckets, repair_empty_buckets, BucketReport};
use crate::error::{FolioError, Result};
use crate::flat::FlatList;
use crate::models::{
    Award, BookChapter, Certification, ConferenceProceeding, EditedBook, Education, Experience,
    JournalArticle, ListRecord, Membership, Project, Record, Reference, Review, Skill, YearRecord,
};
use crate::singleton::{About, Hero, PublicationStats, Singleton, SingletonDoc};
use crate::stats::compute_stats;
use crate::store::DocumentStore;

/// The four year-bucketed publication kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicationKind {
    JournalArticles,
    ConferenceProceedings,
    EditedBooks,
    BookChapters,
}

impl PublicationKind {
    pub const ALL: [PublicationKind; 4] = [
        PublicationKind::JournalArticles,
        PublicationKind::ConferenceProceedings,
        PublicationKind::EditedBooks,
        PublicationKind::BookChapters,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            PublicationKind::JournalArticles => JournalArticle::LAYOUT.collection,
            PublicationKind::ConferenceProceedings => ConferenceProceeding::LAYOUT.collection,
            PublicationKind::EditedBooks => EditedBook::LAYOUT.collection,
            PublicationKind::BookChapters => BookChapter::LAYOUT.collection,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PublicationKind::JournalArticles => "Journal articles",
            PublicationKind::ConferenceProceedings => "Conference proceedings",
            PublicationKind::EditedBooks => "Edited books",
            PublicationKind::BookChapters => "Book chapters",
        }
    }
}

impl fmt::Display for PublicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

impl FromStr for PublicationKind {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "journal_articles" | "journals" | "articles" => Ok(PublicationKind::JournalArticles),
            "conference_proceedings" | "proceedings" | "conferences" => {
                Ok(PublicationKind::ConferenceProceedings)
            }
            "edited_books" | "books" => Ok(PublicationKind::EditedBooks),
            "book_chapters" | "chapters" => Ok(PublicationKind::BookChapters),
            _ => Err(FolioError::InvalidInput(format!(
                "unknown publication kind: '{}'. Must be journal_articles, \
                 conference_proceedings, edited_books, or book_chapters.",
                s
            ))),
        }
    }
}

/// Flat-list sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Skills,
    Education,
    Experience,
    References,
    Memberships,
    Awards,
    Projects,
    Certifications,
    Reviews,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Skills,
        Section::Education,
        Section::Experience,
        Section::References,
        Section::Memberships,
        Section::Awards,
        Section::Projects,
        Section::Certifications,
        Section::Reviews,
    ];

    pub fn document(self) -> &'static str {
        match self {
            Section::Skills => Skill::LAYOUT.document,
            Section::Education => Education::LAYOUT.document,
            Section::Experience => Experience::LAYOUT.document,
            Section::References => Reference::LAYOUT.document,
            Section::Memberships => Membership::LAYOUT.document,
            Section::Awards => Award::LAYOUT.document,
            Section::Projects => Project::LAYOUT.document,
            Section::Certifications => Certification::LAYOUT.document,
            Section::Reviews => Review::LAYOUT.document,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document())
    }
}

impl FromStr for Section {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        let name = normalize_name(s);
        Section::ALL
            .into_iter()
            .find(|section| section.document() == name)
            .ok_or_else(|| FolioError::InvalidInput(format!("unknown section: '{}'", s)))
    }
}

/// Editable singleton documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileDoc {
    Hero,
    About,
}

impl ProfileDoc {
    pub fn document(self) -> &'static str {
        match self {
            ProfileDoc::Hero => Hero::DOCUMENT,
            ProfileDoc::About => About::DOCUMENT,
        }
    }
}

impl FromStr for ProfileDoc {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_name(s).as_str() {
            "hero" => Ok(ProfileDoc::Hero),
            "about" => Ok(ProfileDoc::About),
            _ => Err(FolioError::InvalidInput(format!(
                "unknown profile document: '{}'. Must be hero or about.",
                s
            ))),
        }
    }
}

fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase().replace('-', "_")
}

/// One year of a publication listing, as rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: String,
    pub entries: Vec<Tagged<Value>>,
}

macro_rules! with_publication {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            PublicationKind::JournalArticles => {
                type $r = JournalArticle;
                $body
            }
            PublicationKind::ConferenceProceedings => {
                type $r = ConferenceProceeding;
                $body
            }
            PublicationKind::EditedBooks => {
                type $r = EditedBook;
                $body
            }
            PublicationKind::BookChapters => {
                type $r = BookChapter;
                $body
            }
        }
    };
}

macro_rules! with_section {
    ($section:expr, $r:ident => $body:expr) => {
        match $section {
            Section::Skills => {
                type $r = Skill;
                $body
            }
            Section::Education => {
                type $r = Education;
                $body
            }
            Section::Experience => {
                type $r = Experience;
                $body
            }
            Section::References => {
                type $r = Reference;
                $body
            }
            Section::Memberships => {
                type $r = Membership;
                $body
            }
            Section::Awards => {
                type $r = Award;
                $body
            }
            Section::Projects => {
                type $r = Project;
                $body
            }
            Section::Certifications => {
                type $r = Certification;
                $body
            }
            Section::Reviews => {
                type $r = Review;
                $body
            }
        }
    };
}

fn parse<T: DeserializeOwned>(value: Value) -> Result<T> {
    if !value.is_object() {
        return Err(FolioError::InvalidInput("record must be a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| FolioError::InvalidInput(e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| FolioError::InvalidInput(e.to_string()))
}

fn untype<R: Record>(tagged: Tagged<R>) -> Result<Tagged<Value>> {
    Ok(Tagged {
        record: to_json(&tagged.record)?,
        year: tagged.year,
        index: tagged.index,
    })
}

async fn list_publications<R: YearRecord>(store: &Arc<dyn DocumentStore>) -> Result<Vec<YearGroup>> {
    let all = YearBuckets::<R>::new(store.clone()).load_all().await?;
    let mut groups = Vec::new();
    for (year, tagged) in all.into_iter().rev() {
        if tagged.is_empty() {
            continue;
        }
        let entries = tagged.into_iter().map(untype).collect::<Result<Vec<_>>>()?;
        groups.push(YearGroup { year, entries });
    }
    Ok(groups)
}

async fn list_section<R: ListRecord>(store: &Arc<dyn DocumentStore>) -> Result<Vec<Value>> {
    FlatList::<R>::new(store.clone()).load_raw().await
}

/// Entry point used by the CLI and the HTTP API.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ============ Publications ============

    /// Publications of `kind`, grouped by year, newest year first.
    pub async fn publications(&self, kind: PublicationKind) -> Result<Vec<YearGroup>> {
        with_publication!(kind, R => list_publications::<R>(&self.store).await)
    }

    pub async fn add_publication(
        &self,
        editor: &Editor,
        kind: PublicationKind,
        year: &str,
        record: Value,
    ) -> Result<Tagged<Value>> {
        let tagged = with_publication!(kind, R => {
            let record: R = parse(record)?;
            untype(YearBuckets::<R>::new(self.store.clone()).add(year, record).await?)?
        });
        info!(editor = editor.email(), %kind, year = %tagged.year, index = tagged.index, "publication added");
        Ok(tagged)
    }

    pub async fn update_publication(
        &self,
        editor: &Editor,
        kind: PublicationKind,
        year: &str,
        index: usize,
        record: Value,
    ) -> Result<Tagged<Value>> {
        let tagged = with_publication!(kind, R => {
            let record: R = parse(record)?;
            untype(YearBuckets::<R>::new(self.store.clone()).update(year, index, record).await?)?
        });
        info!(editor = editor.email(), %kind, from = %year, to = %tagged.year, "publication updated");
        Ok(tagged)
    }

    pub async fn remove_publication(
        &self,
        editor: &Editor,
        kind: PublicationKind,
        year: &str,
        index: usize,
    ) -> Result<Value> {
        let removed = with_publication!(kind, R => {
            to_json(&YearBuckets::<R>::new(self.store.clone()).remove(year, index).await?)?
        });
        info!(editor = editor.email(), %kind, %year, index, "publication removed");
        Ok(removed)
    }

    // ============ Flat sections ============

    /// Items of a section exactly as stored, so any of them can be passed
    /// back to [`remove_from_section`](Self::remove_from_section).
    pub async fn section(&self, section: Section) -> Result<Vec<Value>> {
        with_section!(section, R => list_section::<R>(&self.store).await)
    }

    /// Append to a section, returning the new item's index.
    pub async fn add_to_section(
        &self,
        editor: &Editor,
        section: Section,
        record: Value,
    ) -> Result<usize> {
        let index = with_section!(section, R => {
            let record: R = parse(record)?;
            FlatList::<R>::new(self.store.clone()).add(record).await?
        });
        info!(editor = editor.email(), %section, index, "section item added");
        Ok(index)
    }

    pub async fn update_in_section(
        &self,
        editor: &Editor,
        section: Section,
        index: usize,
        record: Value,
    ) -> Result<()> {
        with_section!(section, R => {
            let record: R = parse(record)?;
            FlatList::<R>::new(self.store.clone()).update_at(index, record).await?
        });
        info!(editor = editor.email(), %section, index, "section item updated");
        Ok(())
    }

    /// Remove the first stored item equal to `record`. Fails with
    /// [`FolioError::NotFound`] when nothing matches.
    pub async fn remove_from_section(
        &self,
        editor: &Editor,
        section: Section,
        record: Value,
    ) -> Result<()> {
        with_section!(section, R => {
            parse::<R>(record.clone())?;
            FlatList::<R>::new(self.store.clone()).remove_value(&record).await?
        });
        info!(editor = editor.email(), %section, "section item removed");
        Ok(())
    }

    // ============ Profile documents ============

    pub async fn profile(&self, doc: ProfileDoc) -> Result<Option<Value>> {
        match doc {
            ProfileDoc::Hero => load_singleton::<Hero>(&self.store).await,
            ProfileDoc::About => load_singleton::<About>(&self.store).await,
        }
    }

    pub async fn set_profile(&self, editor: &Editor, doc: ProfileDoc, value: Value) -> Result<()> {
        match doc {
            ProfileDoc::Hero => save_singleton::<Hero>(&self.store, value).await?,
            ProfileDoc::About => save_singleton::<About>(&self.store, value).await?,
        }
        info!(editor = editor.email(), document = doc.document(), "profile saved");
        Ok(())
    }

    // ============ Statistics and maintenance ============

    /// Stored statistics, or freshly computed ones if none were saved yet.
    pub async fn stats(&self) -> Result<PublicationStats> {
        match Singleton::<PublicationStats>::new(self.store.clone()).load().await? {
            Some(stats) => Ok(stats),
            None => compute_stats(&self.store).await,
        }
    }

    /// Recompute statistics and store them.
    pub async fn refresh_stats(&self, editor: &Editor) -> Result<PublicationStats> {
        let stats = compute_stats(&self.store).await?;
        Singleton::<PublicationStats>::new(self.store.clone())
            .save(&stats)
            .await?;
        info!(editor = editor.email(), total = stats.total, "publication stats refreshed");
        Ok(stats)
    }

    pub async fn check(&self) -> Result<Vec<BucketReport>> {
        let mut reports = Vec::new();
        for kind in PublicationKind::ALL {
            reports.push(with_publication!(kind, R => check_buckets::<R>(&self.store).await?));
        }
        Ok(reports)
    }

    /// Delete empty buckets in every publication collection.
    pub async fn repair(&self, editor: &Editor) -> Result<usize> {
        let mut removed = 0;
        for kind in PublicationKind::ALL {
            removed += with_publication!(kind, R => repair_empty_buckets::<R>(&self.store).await?);
        }
        info!(editor = editor.email(), removed, "empty buckets repaired");
        Ok(removed)
    }

    /// The whole portfolio as one JSON document.
    pub async fn export(&self) -> Result<Value> {
        let mut publications = Map::new();
        for kind in PublicationKind::ALL {
            publications.insert(
                kind.collection().to_string(),
                to_json(&self.publications(kind).await?)?,
            );
        }
        let mut sections = Map::new();
        for section in Section::ALL {
            sections.insert(
                section.document().to_string(),
                Value::Array(self.section(section).await?),
            );
        }
        let hero = self.profile(ProfileDoc::Hero).await?;
        let about = self.profile(ProfileDoc::About).await?;
        let stats = compute_stats(&self.store).await?;
        Ok(json!({
            "hero": hero,
            "about": about,
            "publications": publications,
            "sections": sections,
            "stats": stats,
        }))
    }
}

async fn load_singleton<T: SingletonDoc>(store: &Arc<dyn DocumentStore>) -> Result<Option<Value>> {
    match Singleton::<T>::new(store.clone()).load().await? {
        Some(doc) => Ok(Some(to_json(&doc)?)),
        None => Ok(None),
    }
}

async fn save_singleton<T: SingletonDoc>(store: &Arc<dyn DocumentStore>, value: Value) -> Result<()> {
    let doc: T = parse(value)?;
    Singleton::<T>::new(store.clone()).save(&doc).await
}
