//! `cms:search:maintenance` actions.
//!
//! Each [`MaintenanceAction`] is an independent procedure; the
//! [`MaintenanceOrchestrator`] only dispatches and times them.

pub mod confirm;
pub mod orchestrator;

pub use confirm::{Confirm, StdinConfirm};
pub use orchestrator::MaintenanceOrchestrator;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::cache::FlushOutcome;
use crate::db::{AnalyticsSummary, PopularQuery};
use crate::lock::LockError;
use crate::models::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceAction {
    Cleanup,
    CacheClear,
    Stats,
    Optimize,
}

impl MaintenanceAction {
    pub const ALL: [Self; 4] = [Self::Cleanup, Self::CacheClear, Self::Stats, Self::Optimize];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cleanup => "cleanup",
            Self::CacheClear => "cache-clear",
            Self::Stats => "stats",
            Self::Optimize => "optimize",
        }
    }
}

impl fmt::Display for MaintenanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceAction {
    type Err = MaintenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| {
                MaintenanceError::Validation(format!(
                    "Invalid action '{s}'. Available actions: cleanup, cache-clear, stats, optimize"
                ))
            })
    }
}

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Locked(String),
}

impl From<sea_orm::DbErr> for MaintenanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<LockError> for MaintenanceError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Held { .. } => Self::Locked(err.to_string()),
            LockError::Database(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MaintenanceOptions {
    /// Retention window for `cleanup`; falls back to
    /// `search.analytics.retention_days`.
    pub days: Option<i64>,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub days: i64,
    pub cutoff: String,
    pub candidates: u64,
    pub deleted: u64,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsStats {
    pub window_days: i64,
    pub summary: AnalyticsSummary,
    pub success_rate: f64,
    pub popular: Vec<PopularQuery>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub index_counts: BTreeMap<String, u64>,
    pub total_entries: u64,
    /// `None` when analytics are disabled
    pub analytics: Option<AnalyticsStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrphanResult {
    pub kind: EntityKind,
    pub removed: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeReport {
    pub orphans: Vec<OrphanResult>,
    pub orphans_removed: u64,
    /// Error of the statistics refresh, if it failed
    pub statistics_error: Option<String>,
    pub cache: FlushOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum MaintenanceOutcome {
    Cleanup(CleanupReport),
    CacheClear(FlushOutcome),
    Stats(StatsReport),
    Optimize(OptimizeReport),
}

/// Result of one invocation; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceRun {
    pub action: MaintenanceAction,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub outcome: MaintenanceOutcome,
}

impl MaintenanceRun {
    /// Cache clearing is best-effort and never fails a run.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            MaintenanceOutcome::Cleanup(_)
            | MaintenanceOutcome::CacheClear(_)
            | MaintenanceOutcome::Stats(_) => true,
            MaintenanceOutcome::Optimize(report) => {
                report.statistics_error.is_none() && report.orphans.iter().all(|o| o.error.is_none())
            }
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
