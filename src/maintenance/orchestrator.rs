use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::{
    AnalyticsStats, CleanupReport, Confirm, MaintenanceAction, MaintenanceError,
    MaintenanceOptions, MaintenanceOutcome, MaintenanceRun, OptimizeReport, OrphanResult,
    StatsReport,
};
use crate::cache::{CacheService, FlushOutcome};
use crate::config::{Config, MAX_WINDOW_DAYS};
use crate::db::{Store, timestamp};
use crate::lock::AdvisoryLock;
use crate::models::EntityKind;

const CLEANUP_LOCK: &str = "search:cleanup";

/// `now - days`, or `None` past [`MAX_WINDOW_DAYS`].
fn days_ago(days: i64) -> Option<DateTime<Utc>> {
    if days > MAX_WINDOW_DAYS {
        return None;
    }
    chrono::Duration::try_days(days).and_then(|d| Utc::now().checked_sub_signed(d))
}

pub struct MaintenanceOrchestrator {
    store: Store,
    cache: Arc<CacheService>,
    config: Config,
}

impl MaintenanceOrchestrator {
    #[must_use]
    pub const fn new(store: Store, cache: Arc<CacheService>, config: Config) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub async fn run(
        &self,
        action: MaintenanceAction,
        options: &MaintenanceOptions,
        confirm: &dyn Confirm,
    ) -> Result<MaintenanceRun, MaintenanceError> {
        let start = Instant::now();
        info!(action = %action, "Running maintenance action");

        let outcome = match action {
            MaintenanceAction::Cleanup => {
                MaintenanceOutcome::Cleanup(self.cleanup(options, confirm).await?)
            }
            MaintenanceAction::CacheClear => MaintenanceOutcome::CacheClear(self.cache_clear().await),
            MaintenanceAction::Stats => MaintenanceOutcome::Stats(self.stats().await?),
            MaintenanceAction::Optimize => MaintenanceOutcome::Optimize(self.optimize().await?),
        };

        Ok(MaintenanceRun {
            action,
            elapsed: start.elapsed(),
            outcome,
        })
    }

    /// Deletes analytics rows older than the retention window.
    pub async fn cleanup(
        &self,
        options: &MaintenanceOptions,
        confirm: &dyn Confirm,
    ) -> Result<CleanupReport, MaintenanceError> {
        let days = options
            .days
            .unwrap_or(self.config.search.analytics.retention_days);
        if days < 1 {
            return Err(MaintenanceError::Validation(format!(
                "Days must be a positive number, got {days}"
            )));
        }

        let cutoff = days_ago(days).ok_or_else(|| {
            MaintenanceError::Validation(format!(
                "Days must be at most {MAX_WINDOW_DAYS}, got {days}"
            ))
        })?;
        let analytics = self.store.analytics();
        let candidates = analytics.count_older_than(cutoff).await?;

        let mut report = CleanupReport {
            days,
            cutoff: timestamp(cutoff),
            candidates,
            deleted: 0,
            cancelled: false,
        };

        if candidates == 0 {
            info!(days, "No analytics records to clean up");
            return Ok(report);
        }

        if !options.force
            && !confirm.confirm(&format!(
                "Delete {candidates} search analytics records older than {days} days?"
            ))
        {
            report.cancelled = true;
            return Ok(report);
        }

        let ttl = self.config.maintenance.lock_ttl();
        let lock = AdvisoryLock::acquire(&self.store, CLEANUP_LOCK, ttl).await?;

        let deleted = analytics.delete_older_than(cutoff).await;
        lock.release().await;

        report.deleted = deleted?;
        info!(days, deleted = report.deleted, "Cleaned up search analytics");
        Ok(report)
    }

    /// Flushes every configured tag; failures degrade to key patterns.
    pub async fn cache_clear(&self) -> FlushOutcome {
        let outcome = self.cache.flush_by_tags(&self.cache.known_tags()).await;
        if !outcome.is_complete() {
            warn!(
                failed = ?outcome.failed_patterns,
                "Some cache key patterns could not be cleared"
            );
        }
        outcome
    }

    pub async fn stats(&self) -> Result<StatsReport, MaintenanceError> {
        let index = self.store.search_index();
        let mut index_counts = index.counts_by_type().await?;

        if let Ok(kinds) = EntityKind::parse_list(&self.config.search.indexing.indexable_models) {
            for kind in kinds {
                index_counts.entry(kind.as_str().to_string()).or_insert(0);
            }
        }
        let total_entries = index_counts.values().sum();

        let analytics_config = &self.config.search.analytics;
        let analytics = if analytics_config.enabled {
            let since = days_ago(analytics_config.stats_window_days).ok_or_else(|| {
                MaintenanceError::Validation(format!(
                    "Stats window must be at most {MAX_WINDOW_DAYS} days, got {}",
                    analytics_config.stats_window_days
                ))
            })?;
            let repo = self.store.analytics();
            let summary = repo.summary_since(since).await?;
            let popular = repo
                .popular_since(since, analytics_config.popular_queries_limit)
                .await?;

            Some(AnalyticsStats {
                window_days: analytics_config.stats_window_days,
                success_rate: summary.success_rate(),
                summary,
                popular,
            })
        } else {
            None
        };

        Ok(StatsReport {
            index_counts,
            total_entries,
            analytics,
        })
    }

    /// Orphan removal, statistics refresh, then a full cache clear.
    pub async fn optimize(&self) -> Result<OptimizeReport, MaintenanceError> {
        let kinds = EntityKind::parse_list(&self.config.maintenance.owner_types)
            .map_err(|e| MaintenanceError::Validation(e.to_string()))?;

        let index = self.store.search_index();
        let mut orphans = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let result = match index.delete_orphans(kind).await {
                Ok(removed) => {
                    info!(kind = %kind, removed, "Removed orphaned index entries");
                    OrphanResult {
                        kind,
                        removed,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Failed to remove orphaned index entries");
                    OrphanResult {
                        kind,
                        removed: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            orphans.push(result);
        }
        let orphans_removed = orphans.iter().map(|o| o.removed).sum();

        let statistics_error = self.refresh_statistics().await.err();
        let cache = self.cache_clear().await;

        Ok(OptimizeReport {
            orphans,
            orphans_removed,
            statistics_error,
            cache,
        })
    }

    async fn refresh_statistics(&self) -> Result<(), String> {
        self.store
            .conn
            .execute_unprepared("ANALYZE")
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!(error = %e, "Statistics refresh failed");
                e.to_string()
            })
    }
}
