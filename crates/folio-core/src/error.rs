//! Error type shared by the repositories and the access gate.
//!
//! A missing document is never an error on read: repositories treat it as
//! an empty bucket or list. Everything the backend reports is folded into
//! [`FolioError::Store`] without further classification.

use thiserror::Error;

/// Result alias used throughout `folio-core`.
pub type Result<T> = std::result::Result<T, FolioError>;

#[derive(Debug, Error)]
pub enum FolioError {
    /// A positional or id-based lookup did not resolve to a record.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record is missing one or more required fields.
    #[error("invalid record: missing required field(s): {}", .missing.join(", "))]
    InvalidRecord { missing: Vec<&'static str> },

    /// Input could not be interpreted (unknown kind, malformed year, bad JSON).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The identity is not allowed to edit portfolio data.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A stored document does not have the shape its kind expects.
    #[error("cannot decode {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any failure reported by the document store.
    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl FolioError {
    pub(crate) fn decode(location: impl Into<String>, source: serde_json::Error) -> Self {
        FolioError::Decode {
            location: location.into(),
            source,
        }
    }

    /// Short machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            FolioError::NotFound(_) => "not_found",
            FolioError::InvalidRecord { .. } | FolioError::InvalidInput(_) => "bad_request",
            FolioError::Forbidden(_) => "forbidden",
            FolioError::Decode { .. } | FolioError::Store(_) => "internal",
        }
    }
}
