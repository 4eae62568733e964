//! Tag-aware caching for CMS components.
//!
//! [`CacheService`] is the only entry point the rest of the crate uses. It
//! derives keys from `(component, operation, params)`, attaches the tags
//! configured for the component and keeps hit/miss/write/invalidation
//! counters. Storage sits behind [`CacheStore`] so the `memory` and
//! `database` drivers are interchangeable.

pub mod clear;
pub mod database;
pub mod memory;
pub mod service;
pub mod stats;
pub mod store;
pub mod tags;
pub mod warm;

pub use clear::{CacheClearer, ClearItemResult, ClearReport, ClearTarget};
pub use database::DatabaseCacheStore;
pub use memory::MemoryCacheStore;
pub use service::{CacheInfo, CacheService, FlushMode, FlushOutcome};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::CacheStore;
pub use warm::{CacheWarmer, WarmItem, WarmItemResult, WarmOptions};

use crate::config::CacheConfig;
use crate::db::Store;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache driver '{0}' does not support tags")]
    TagsUnsupported(&'static str),

    #[error("Invalid key pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Unknown cache driver: {0}")]
    UnknownDriver(String),

    #[error("Unknown cache component: {0}")]
    UnknownComponent(String),

    #[error("Unknown cache tag: {0}")]
    UnknownTag(String),

    #[error("Unknown cache item: {0}")]
    UnknownItem(String),

    #[error("Cache is disabled (use --force to write anyway)")]
    Disabled,

    #[error("Failed to write {component}:{operation}")]
    WriteFailed { component: String, operation: String },

    #[error("Failed to clear key patterns: {}", .0.join(", "))]
    PatternsFailed(Vec<String>),
}

impl From<sea_orm::DbErr> for CacheError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Builds the store selected by `cache.driver`.
pub fn store_for_driver(config: &CacheConfig, store: &Store) -> Result<Arc<dyn CacheStore>, CacheError> {
    match config.driver.as_str() {
        "database" => Ok(Arc::new(DatabaseCacheStore::new(store.cache_rows()))),
        "memory" => Ok(Arc::new(MemoryCacheStore::new())),
        other => Err(CacheError::UnknownDriver(other.to_string())),
    }
}
