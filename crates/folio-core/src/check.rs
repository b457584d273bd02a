//! Consistency check for year-bucketed collections.
//!
//! Reads raw bucket documents and reports anything that breaks the bucket
//! invariants. Duplicate ids across buckets are what an interrupted move
//! leaves behind on a backend without atomic batches.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::buckets::decode_array;
use crate::error::Result;
use crate::models::{BucketLayout, YearRecord};
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A bucket document whose array is empty or missing.
    EmptyBucket { year: String },
    /// A bucket id that is not a 4-digit year.
    NonYearBucket { id: String },
    /// A record whose own `year` differs from its bucket.
    MisfiledRecord {
        year: String,
        index: usize,
        record_year: String,
    },
    /// The same stable id is carried by more than one record. `years`
    /// lists each bucket holding it once.
    DuplicateId {
        id: String,
        count: usize,
        years: Vec<String>,
    },
    /// The bucket's array does not decode as the kind's records.
    Undecodable { year: String, message: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::EmptyBucket { year } => write!(f, "bucket {} is empty", year),
            Finding::NonYearBucket { id } => write!(f, "bucket id {:?} is not a year", id),
            Finding::MisfiledRecord {
                year,
                index,
                record_year,
            } => write!(
                f,
                "record {}#{} says year {:?}",
                year, index, record_year
            ),
            Finding::DuplicateId { id, count, years } => {
                write!(f, "id {} appears {} times in {}", id, count, years.join(", "))
            }
            Finding::Undecodable { year, message } => {
                write!(f, "bucket {} cannot be decoded: {}", year, message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    pub collection: &'static str,
    pub buckets: usize,
    pub records: usize,
    pub findings: Vec<Finding>,
}

impl BucketReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

fn is_year(id: &str) -> bool {
    id.len() == 4 && id.chars().all(|c| c.is_ascii_digit())
}

/// Inspect every bucket of kind `R`.
pub async fn check_buckets<R: YearRecord>(store: &Arc<dyn DocumentStore>) -> Result<BucketReport> {
    let layout: BucketLayout = R::LAYOUT;
    let docs = store.list_documents(layout.collection).await?;

    let mut findings = Vec::new();
    let mut seen: BTreeMap<String, (usize, Vec<String>)> = BTreeMap::new();
    let mut records_total = 0;

    for doc in &docs {
        if !is_year(&doc.id) {
            findings.push(Finding::NonYearBucket { id: doc.id.clone() });
        }
        let records: Vec<R> = match decode_array(&doc.fields, layout, &doc.id) {
            Ok(records) => records,
            Err(e) => {
                findings.push(Finding::Undecodable {
                    year: doc.id.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };
        if records.is_empty() {
            findings.push(Finding::EmptyBucket {
                year: doc.id.clone(),
            });
        }
        records_total += records.len();
        for (index, record) in records.iter().enumerate() {
            if record.year().trim() != doc.id {
                findings.push(Finding::MisfiledRecord {
                    year: doc.id.clone(),
                    index,
                    record_year: record.year().to_string(),
                });
            }
            if !record.id().is_empty() {
                let (count, years) = seen.entry(record.id().to_string()).or_default();
                *count += 1;
                if years.last() != Some(&doc.id) {
                    years.push(doc.id.clone());
                }
            }
        }
    }

    for (id, (count, years)) in seen {
        if count > 1 {
            findings.push(Finding::DuplicateId { id, count, years });
        }
    }

    Ok(BucketReport {
        collection: layout.collection,
        buckets: docs.len(),
        records: records_total,
        findings,
    })
}

/// Delete every empty bucket of kind `R`. Returns how many were removed.
pub async fn repair_empty_buckets<R: YearRecord>(store: &Arc<dyn DocumentStore>) -> Result<usize> {
    let layout = R::LAYOUT;
    let mut removed = 0;
    for doc in store.list_documents(layout.collection).await? {
        let empty = match doc.fields.get(layout.field) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        };
        if empty {
            store.delete_document(layout.collection, &doc.id).await?;
            info!(collection = layout.collection, year = %doc.id, "deleted empty bucket");
            removed += 1;
        }
    }
    Ok(removed)
}
