use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cache::tags::default_component_tags;
use crate::cache::warm::WarmItem;
use crate::models::EntityKind;

pub const MIN_BATCH_SIZE: u64 = 1;
pub const MAX_BATCH_SIZE: u64 = 1000;

/// Upper bound for any day-based window (retention, stats, `--days`).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

pub const MAX_LOCK_TTL_SECONDS: i64 = 7 * 24 * 3600;

pub const MAX_CACHE_TTL_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub search: SearchConfig,

    pub cache: CacheConfig,

    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// `text` or `json`
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/cms.db".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,

    pub indexing: IndexingConfig,

    pub analytics: AnalyticsConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            indexing: IndexingConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Rows fetched and written per batch during reindex (1-1000)
    pub batch_size: u64,

    /// Entity types included in a full reindex
    pub indexable_models: Vec<String>,

    /// Upper bound on derived keywords per index entry
    pub max_keywords: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            indexable_models: vec!["content".to_string(), "term".to_string()],
            max_keywords: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub enabled: bool,

    /// Default retention window for `cleanup` when `--days` is omitted
    pub retention_days: i64,

    /// Trailing window used by the stats report
    pub stats_window_days: i64,

    pub popular_queries_limit: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 365,
            stats_window_days: 30,
            popular_queries_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Global kill-switch; when off reads miss and writes are skipped
    pub enabled: bool,

    /// `database` or `memory`
    pub driver: String,

    pub prefix: String,

    /// Entry lifetime in seconds, 0 keeps entries until invalidated
    pub default_ttl_seconds: u64,

    /// Component name -> tags attached to every entry that component writes
    pub tags: BTreeMap<String, Vec<String>>,

    pub warm: WarmConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            driver: "database".to_string(),
            prefix: "cms".to_string(),
            default_ttl_seconds: 3600,
            tags: default_component_tags(),
            warm: WarmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmConfig {
    /// Items warmed when `--items` is omitted
    pub items: Vec<String>,

    pub chunk_size: u64,

    /// Pause between chunks of paginated items
    pub delay_ms: u64,
}

impl Default for WarmConfig {
    fn default() -> Self {
        Self {
            items: WarmItem::ALL.iter().map(|i| i.as_str().to_string()).collect(),
            chunk_size: 100,
            delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Lease length of the advisory lock around reindex and cleanup
    pub lock_ttl_seconds: i64,

    /// Entity types checked for orphaned index entries by `optimize`
    pub owner_types: Vec<String>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: 3600,
            owner_types: EntityKind::ALL
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
        }
    }
}

impl MaintenanceConfig {
    /// Lease length, clamped to the range `validate` accepts.
    #[must_use]
    pub fn lock_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lock_ttl_seconds.clamp(1, MAX_LOCK_TTL_SECONDS))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cmsctl").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cmsctl").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        let batch_size = self.search.indexing.batch_size;
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&batch_size) {
            anyhow::bail!(
                "search.indexing.batch_size must be between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE}, got {batch_size}"
            );
        }

        EntityKind::parse_list(&self.search.indexing.indexable_models)
            .context("Invalid search.indexing.indexable_models")?;

        EntityKind::parse_list(&self.maintenance.owner_types)
            .context("Invalid maintenance.owner_types")?;

        let analytics = &self.search.analytics;
        if !(1..=MAX_WINDOW_DAYS).contains(&analytics.retention_days) {
            anyhow::bail!(
                "search.analytics.retention_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                analytics.retention_days
            );
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&analytics.stats_window_days) {
            anyhow::bail!(
                "search.analytics.stats_window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                analytics.stats_window_days
            );
        }

        if !matches!(self.cache.driver.as_str(), "database" | "memory") {
            anyhow::bail!(
                "Unsupported cache driver '{}', expected 'database' or 'memory'",
                self.cache.driver
            );
        }

        if self.cache.prefix.trim().is_empty() {
            anyhow::bail!("cache.prefix cannot be empty");
        }

        if self.cache.default_ttl_seconds > MAX_CACHE_TTL_SECONDS {
            anyhow::bail!(
                "cache.default_ttl_seconds must be at most {MAX_CACHE_TTL_SECONDS}, got {}",
                self.cache.default_ttl_seconds
            );
        }

        if !(1..=MAX_LOCK_TTL_SECONDS).contains(&self.maintenance.lock_ttl_seconds) {
            anyhow::bail!(
                "maintenance.lock_ttl_seconds must be between 1 and {MAX_LOCK_TTL_SECONDS}, got {}",
                self.maintenance.lock_ttl_seconds
            );
        }

        Ok(())
    }

    /// Resolves a dotted key such as `cms.search.indexing.batch_size`.
    ///
    /// The leading `cms.` namespace is optional.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<toml::Value> {
        let root = toml::Value::try_from(self).ok()?;
        let path = key.strip_prefix("cms.").unwrap_or(key);

        path.split('.')
            .try_fold(root, |value, segment| value.get(segment).cloned())
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.lookup(key)
            .and_then(|v| v.as_str().map(std::string::ToString::to_string))
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.lookup(key).and_then(|v| v.as_bool())
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.lookup(key).and_then(|v| v.as_integer())
    }

    #[must_use]
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let value = self.lookup(key)?;
        let items = value.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(std::string::ToString::to_string))
                .collect(),
        )
    }
}
