//! # Folio Core
//!
//! Runtime-agnostic logic for Folio: record kinds, the document store
//! trait, the year-bucket and flat-list repositories, profile documents,
//! and the owner access gate.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Backends
//! implement [`store::DocumentStore`]; [`store::memory::MemoryStore`] is
//! included for tests and previews.

pub mod access;
pub mod buckets;
pub mod catalog;
pub mod check;
pub mod error;
pub mod flat;
pub mod models;
pub mod singleton;
pub mod stats;
pub mod store;

pub use error::{FolioError, Result};
