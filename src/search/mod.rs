//! Search index maintenance: reindexing, keyword derivation and lookups.

pub mod keywords;
pub mod service;

pub use service::{
    BatchSize, ReindexEstimate, ReindexReport, SearchHit, SearchResults, SearchService,
    TypeOutcome,
};

use thiserror::Error;

use crate::lock::LockError;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Locked(String),

    #[error("Search is disabled (cms.search.enabled = false)")]
    Disabled,
}

impl From<sea_orm::DbErr> for SearchError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<LockError> for SearchError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Held { .. } => Self::Locked(err.to_string()),
            LockError::Database(e) => e.into(),
        }
    }
}
