//! # Folio
//!
//! A self-hosted academic portfolio with an owner-only content editor.
//!
//! Folio stores a researcher's publications in per-year bucket documents,
//! keeps the remaining portfolio sections (skills, education, awards, ...)
//! as flat lists, and serves everything through a CLI and a JSON HTTP API.
//! Only the configured owner may write.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐
//! │   CLI    │   │   HTTP   │
//! │ (folio)  │   │  (axum)  │
//! └────┬─────┘   └────┬─────┘
//!      └──────┬───────┘
//!             ▼
//!      ┌─────────────┐   ┌──────────────┐
//!      │   Catalog    │──▶│ DocumentStore │
//!      │ (folio-core) │   │   (SQLite)    │
//!      └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! folio init
//! folio --as me@university.edu pubs add journal-articles 2024 --file paper.json
//! folio pubs list journal-articles
//! folio serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite document store |
//! | [`session`] | Catalog opening and CLI identity |
//! | [`pubs`], [`sections`], [`profile`] | Editing commands |
//! | [`stats`], [`check`], [`export`] | Reporting commands |
//! | [`server`] | HTTP API |

pub mod check;
pub mod config;
pub mod db;
pub mod export;
pub mod input;
pub mod migrate;
pub mod profile;
pub mod pubs;
pub mod sections;
pub mod server;
pub mod session;
pub mod sqlite_store;
pub mod stats;

pub use folio_core;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; defaults to `folio=info,sqlx=warn`. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("folio=info,folio_core=info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
