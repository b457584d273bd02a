//! Record kinds stored in the portfolio.
//!
//! Every list-valued section of the site is a vector of one of these
//! records. Publications are partitioned into one document per year
//! ([`YearRecord`]); every other section lives in a single document with an
//! `items` array ([`ListRecord`]).
//!
//! Stored field names match what the site has always written, so existing
//! documents decode unchanged. Records written by older editors carry no
//! `id`; they stay addressable by position. Fields a record kind does not
//! model land in its `extra` map and are written back as they were read.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::store::Fields;

/// Where a year-bucketed kind keeps its documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketLayout {
    /// Collection holding one document per year.
    pub collection: &'static str,
    /// Array field inside each year document.
    pub field: &'static str,
}

/// Where a flat-list section keeps its single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLayout {
    pub collection: &'static str,
    pub document: &'static str,
    pub field: &'static str,
}

impl ListLayout {
    /// Flat lists all live in the `portfolio` collection under `items`.
    pub const fn portfolio(document: &'static str) -> Self {
        Self {
            collection: "portfolio",
            document,
            field: "items",
        }
    }
}

/// A value stored as one element of a bucket or list array.
pub trait Record:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// Stable identifier, empty for records created before ids existed.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Names of required fields that are blank.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Reject records with blank required fields.
    fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FolioError::InvalidRecord { missing })
        }
    }

    /// Give the record a fresh UUID if it has none.
    fn ensure_id(&mut self) {
        if self.id().is_empty() {
            self.set_id(uuid::Uuid::new_v4().to_string());
        }
    }
}

/// A record partitioned by publication year.
pub trait YearRecord: Record {
    const LAYOUT: BucketLayout;

    fn year(&self) -> &str;

    fn set_year(&mut self, year: String);

    fn is_first_author(&self) -> bool {
        false
    }

    fn is_corresponding_author(&self) -> bool {
        false
    }

    fn citations(&self) -> u32 {
        0
    }
}

/// A record kept in a single flat list document.
pub trait ListRecord: Record {
    const LAYOUT: ListLayout;
}

macro_rules! impl_record {
    ($ty:ty, [$($required:ident),+ $(,)?]) => {
        impl Record for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn missing_fields(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $(
                    if self.$required.trim().is_empty() {
                        missing.push(stringify!($required));
                    }
                )+
                missing
            }
        }
    };
}

macro_rules! impl_year_record {
    ($ty:ty, $collection:literal, $field:literal) => {
        impl YearRecord for $ty {
            const LAYOUT: BucketLayout = BucketLayout {
                collection: $collection,
                field: $field,
            };

            fn year(&self) -> &str {
                &self.year
            }

            fn set_year(&mut self, year: String) {
                self.year = year;
            }

            fn is_first_author(&self) -> bool {
                self.is_first_author
            }

            fn is_corresponding_author(&self) -> bool {
                self.is_corresponding_author
            }

            fn citations(&self) -> u32 {
                self.citations.unwrap_or(0)
            }
        }
    };
}

macro_rules! impl_list_record {
    ($ty:ty, $document:literal) => {
        impl ListRecord for $ty {
            const LAYOUT: ListLayout = ListLayout::portfolio($document);
        }
    };
}

/// Publication status shown next to a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Published,
    Accepted,
    InPress,
    UnderReview,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

// ============ Year-bucketed publications ============

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalArticle {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_first_author: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_corresponding_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(JournalArticle, [title, authors, journal, year]);
impl_year_record!(JournalArticle, "journal_articles", "articles");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConferenceProceeding {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub authors: String,
    pub conference: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_first_author: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_corresponding_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(ConferenceProceeding, [title, authors, conference, year]);
impl_year_record!(ConferenceProceeding, "conference_proceedings", "proceedings");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditedBook {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub editors: String,
    pub publisher: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_first_author: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_corresponding_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(EditedBook, [title, editors, publisher, year]);
impl_year_record!(EditedBook, "edited_books", "books");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookChapter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub authors: String,
    pub book_title: String,
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_first_author: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_corresponding_author: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(BookChapter, [title, authors, book_title, year]);
impl_year_record!(BookChapter, "book_chapters", "chapters");

// ============ Flat-list sections ============

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Skill, [name]);
impl_list_record!(Skill, "skills");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub degree: String,
    pub institution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesis: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Education, [degree, institution]);
impl_list_record!(Education, "education");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub role: String,
    pub organization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Experience, [role, organization]);
impl_list_record!(Experience, "experience");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Reference, [name]);
impl_list_record!(Reference, "references");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Membership {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub organization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Membership, [organization]);
impl_list_record!(Membership, "memberships");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Award {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Award, [title]);
impl_list_record!(Award, "awards");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Project, [title]);
impl_list_record!(Project, "projects");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Certification, [name]);
impl_list_record!(Certification, "certifications");

/// Peer-review service for a journal or conference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Fields this version does not model, written back as read.
    #[serde(flatten)]
    pub extra: Fields,
}

impl_record!(Review, [venue]);
impl_list_record!(Review, "reviews");
