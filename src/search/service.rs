use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::SearchError;
use super::keywords;
use crate::config::{MAX_BATCH_SIZE, MIN_BATCH_SIZE, SearchConfig};
use crate::db::{IndexEntry, Store};
use crate::entities::search_index;
use crate::lock::AdvisoryLock;
use crate::models::{EntityKind, EntityRecord};

const REINDEX_LOCK: &str = "search:reindex";

/// Rows per reindex batch, always within `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(u64);

impl BatchSize {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(100)
    }
}

impl TryFrom<u64> for BatchSize {
    type Error = SearchError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if (MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SearchError::Validation(format!(
                "Batch size must be between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE}, got {value}"
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReindexEstimate {
    pub count: u64,
    pub batches: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeOutcome {
    pub kind: EntityKind,
    pub indexed: u64,
    pub batches: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReindexReport {
    pub outcomes: Vec<TypeOutcome>,
    pub total_indexed: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl ReindexReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.error.is_none())
    }

    #[must_use]
    pub fn failed_kinds(&self) -> Vec<EntityKind> {
        self.outcomes
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.kind)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub searchable_type: String,
    pub searchable_id: i64,
    pub title: String,
    pub category: String,
    pub indexed_at: String,
}

impl From<search_index::Model> for SearchHit {
    fn from(model: search_index::Model) -> Self {
        Self {
            searchable_type: model.searchable_type,
            searchable_id: model.searchable_id,
            title: model.title,
            category: model.category,
            indexed_at: model.indexed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub execution_time_ms: i64,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

pub struct SearchService {
    store: Store,
    config: SearchConfig,
    lock_ttl: chrono::Duration,
}

impl SearchService {
    #[must_use]
    pub const fn new(store: Store, config: SearchConfig, lock_ttl: chrono::Duration) -> Self {
        Self {
            store,
            config,
            lock_ttl,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Entity types a reindex walks.
    ///
    /// With no request this is every configured indexable type; a requested
    /// type that is not configured is a validation error.
    pub fn resolve_kinds(&self, requested: Option<&[String]>) -> Result<Vec<EntityKind>, SearchError> {
        let registered = EntityKind::parse_list(&self.config.indexing.indexable_models)
            .map_err(|e| SearchError::Validation(e.to_string()))?;

        let Some(requested) = requested.filter(|r| !r.is_empty()) else {
            return Ok(registered);
        };

        let kinds =
            EntityKind::parse_list(requested).map_err(|e| SearchError::Validation(e.to_string()))?;
        if let Some(kind) = kinds.iter().find(|k| !registered.contains(k)) {
            return Err(SearchError::Validation(format!(
                "Entity type '{kind}' is not indexable (see cms.search.indexing.indexable_models)"
            )));
        }

        Ok(kinds)
    }

    /// Row and batch counts a reindex of `kinds` would process. Read-only.
    pub async fn estimate_reindex_size(
        &self,
        kinds: &[EntityKind],
        batch: BatchSize,
    ) -> Result<BTreeMap<EntityKind, ReindexEstimate>, SearchError> {
        let repo = self.store.entities();
        let mut estimates = BTreeMap::new();

        for &kind in kinds {
            let count = repo.count(kind).await?;
            estimates.insert(
                kind,
                ReindexEstimate {
                    count,
                    batches: count.div_ceil(batch.get()),
                },
            );
        }

        Ok(estimates)
    }

    /// Rebuilds the index entries of `kinds` batch by batch.
    ///
    /// `progress` receives the type and its running total after every
    /// committed batch. A failing type is recorded in the report and the
    /// remaining types still run; batches committed before the failure stay.
    pub async fn reindex_all<F>(
        &self,
        kinds: &[EntityKind],
        batch: BatchSize,
        mut progress: F,
    ) -> Result<ReindexReport, SearchError>
    where
        F: FnMut(EntityKind, u64),
    {
        if !self.is_enabled() {
            return Err(SearchError::Disabled);
        }

        let lock = AdvisoryLock::acquire(&self.store, REINDEX_LOCK, self.lock_ttl).await?;

        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let mut indexed = 0;
            let mut batches = 0;
            let result = self
                .reindex_kind(kind, batch, &mut indexed, &mut batches, &mut progress)
                .await;

            let error = match result {
                Ok(()) => {
                    info!(kind = %kind, indexed, batches, "Reindexed entity type");
                    None
                }
                Err(e) => {
                    error!(kind = %kind, indexed, error = %e, "Reindex failed for entity type");
                    Some(e.to_string())
                }
            };

            outcomes.push(TypeOutcome {
                kind,
                indexed,
                batches,
                error,
            });
        }

        lock.release().await;

        let elapsed = start.elapsed();
        let total_indexed = outcomes.iter().map(|o| o.indexed).sum();
        metrics::histogram!("cms_search_reindex_duration_seconds").record(elapsed.as_secs_f64());
        metrics::counter!("cms_search_indexed_total").increment(total_indexed);

        Ok(ReindexReport {
            outcomes,
            total_indexed,
            elapsed,
        })
    }

    async fn reindex_kind<F>(
        &self,
        kind: EntityKind,
        batch: BatchSize,
        indexed: &mut u64,
        batches: &mut u64,
        progress: &mut F,
    ) -> Result<(), SearchError>
    where
        F: FnMut(EntityKind, u64),
    {
        let entities = self.store.entities();
        let index = self.store.search_index();
        let mut cursor = 0;

        loop {
            let rows = entities.chunk_after(kind, cursor, batch.get(), None).await?;
            let Some(last) = rows.last() else {
                break;
            };
            cursor = last.id;
            let done = (rows.len() as u64) < batch.get();

            let entries: Vec<IndexEntry> = rows.iter().map(|r| self.build_entry(r)).collect();
            let written = entries.len() as u64;
            index.bulk_replace(entries).await?;

            *indexed += written;
            *batches += 1;
            progress(kind, *indexed);

            if done {
                break;
            }
        }

        Ok(())
    }

    fn build_entry(&self, record: &EntityRecord) -> IndexEntry {
        IndexEntry {
            kind: record.kind,
            searchable_id: record.id,
            title: record.title.clone(),
            content: record.body.clone(),
            keywords: keywords::extract(
                &[&record.title, &record.body],
                self.config.indexing.max_keywords,
            ),
            category: record.category.clone(),
        }
    }

    /// Looks `query` up in the index and records the search in analytics.
    pub async fn search(&self, query: &str, limit: u64) -> Result<SearchResults, SearchError> {
        if !self.is_enabled() {
            return Err(SearchError::Disabled);
        }

        let terms = keywords::query_terms(query);
        if terms.is_empty() {
            return Err(SearchError::Validation("Search query cannot be empty".to_string()));
        }

        let start = Instant::now();
        let result = self.store.search_index().search(&terms, limit).await;
        let execution_time_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

        let (results_count, successful) = match &result {
            Ok(rows) => (i32::try_from(rows.len()).unwrap_or(i32::MAX), true),
            Err(_) => (0, false),
        };

        if self.config.analytics.enabled {
            if let Err(e) = self
                .store
                .analytics()
                .record(query, results_count, execution_time_ms, successful, Utc::now())
                .await
            {
                warn!(error = %e, "Failed to record search analytics");
            }
        }

        let rows = result?;
        Ok(SearchResults {
            query: query.to_string(),
            hits: rows.into_iter().map(SearchHit::from).collect(),
            execution_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_bounds() {
        assert_eq!(BatchSize::default().get(), 100);
        assert_eq!(BatchSize::try_from(1).unwrap().get(), 1);
        assert_eq!(BatchSize::try_from(1000).unwrap().get(), 1000);
        assert!(matches!(
            BatchSize::try_from(0),
            Err(SearchError::Validation(_))
        ));
        assert!(BatchSize::try_from(1001).is_err());
    }
}
