use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::stats::{CacheStats, CacheStatsSnapshot};
use super::store::CacheStore;
use super::tags::{components_tagged, known_tags};
use super::CacheError;
use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    Tags,
    Patterns,
}

/// Result of [`CacheService::flush_by_tags`].
#[derive(Debug, Clone, Serialize)]
pub struct FlushOutcome {
    pub mode: FlushMode,
    /// `None` when the backend flushed but could not count entries.
    pub removed: Option<u64>,
    pub failed_patterns: Vec<String>,
}

impl FlushOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_patterns.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub enabled: bool,
    pub driver: String,
    pub prefix: String,
    pub store_class: String,
    pub supports_tags: bool,
    pub default_ttl_seconds: u64,
}

pub struct CacheService {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    stats: CacheStats,
}

impl CacheService {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig, stats: CacheStats) -> Self {
        Self {
            store,
            config,
            stats,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Deterministic key for `(component, operation, params)`.
    ///
    /// Empty params (`null`, `{}` or `[]`) leave the hash segment off so
    /// parameterless entries get readable keys.
    #[must_use]
    pub fn key(&self, component: &str, operation: &str, params: &Value) -> String {
        let base = format!("{}:{component}:{operation}", self.config.prefix);
        if params_are_empty(params) {
            return base;
        }

        let mut hasher = DefaultHasher::new();
        params.to_string().hash(&mut hasher);
        format!("{base}:{:016x}", hasher.finish())
    }

    #[must_use]
    pub fn component_tags(&self, component: &str) -> Option<&[String]> {
        self.config.tags.get(component).map(Vec::as_slice)
    }

    #[must_use]
    pub fn known_tags(&self) -> Vec<String> {
        known_tags(&self.config.tags)
    }

    #[must_use]
    pub fn is_known_tag(&self, tag: &str) -> bool {
        self.config.tags.values().flatten().any(|t| t == tag)
    }

    pub async fn get(&self, component: &str, operation: &str, params: &Value) -> Option<Value> {
        if !self.is_enabled() {
            self.stats.record_miss();
            return None;
        }

        let key = self.key(component, operation, params);
        match self.store.get(&key).await {
            Ok(Some(value)) => {
                self.stats.record_hit();
                Some(value)
            }
            Ok(None) => {
                self.stats.record_miss();
                None
            }
            Err(e @ CacheError::Serialization(_)) => {
                warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.discard(&key).await;
                self.stats.record_miss();
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Writes `value` tagged with the component's tags.
    ///
    /// Returns `false` when the cache is disabled (and `force` is off) or the
    /// backend rejects the write.
    pub async fn put(
        &self,
        component: &str,
        operation: &str,
        value: &Value,
        params: &Value,
        force: bool,
    ) -> bool {
        if !self.is_enabled() && !force {
            return false;
        }

        let key = self.key(component, operation, params);
        let tags = self.component_tags(component).unwrap_or_default();
        let ttl = match self.config.default_ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        match self.store.put(&key, value, tags, ttl).await {
            Ok(()) => {
                self.stats.record_write();
                debug!(key = %key, tags = ?tags, "Cache entry written");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }

    async fn discard(&self, key: &str) {
        match self.store.forget(key).await {
            Ok(true) => self.stats.record_invalidations(1),
            Ok(false) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache forget failed"),
        }
    }

    /// Invalidates every entry carrying any of `tags`.
    ///
    /// Stores without tag support, or a failing tag flush, fall back to
    /// deleting the key patterns of every component tagged with one of
    /// `tags`. Pattern failures are collected, never raised.
    pub async fn flush_by_tags(&self, tags: &[String]) -> FlushOutcome {
        if self.store.supports_tags() {
            match self.store.flush_tags(tags).await {
                Ok(removed) => {
                    self.stats.record_invalidations(removed.unwrap_or(1));
                    debug!(tags = ?tags, removed = ?removed, "Flushed cache tags");
                    return FlushOutcome {
                        mode: FlushMode::Tags,
                        removed,
                        failed_patterns: Vec::new(),
                    };
                }
                Err(e) => {
                    warn!(tags = ?tags, error = %e, "Tag flush failed, falling back to key patterns");
                }
            }
        }

        let mut removed = 0;
        let mut failed_patterns = Vec::new();
        for pattern in self.fallback_patterns(tags) {
            match self.store.forget_matching(&pattern).await {
                Ok(n) => removed += n,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Pattern flush failed");
                    failed_patterns.push(pattern);
                }
            }
        }

        self.stats.record_invalidations(removed);
        FlushOutcome {
            mode: FlushMode::Patterns,
            removed: Some(removed),
            failed_patterns,
        }
    }

    fn fallback_patterns(&self, tags: &[String]) -> BTreeSet<String> {
        let prefix = &self.config.prefix;
        let mut patterns: BTreeSet<String> = components_tagged(&self.config.tags, tags)
            .into_iter()
            .map(|component| format!("{prefix}:{component}:*"))
            .collect();

        for tag in tags.iter().filter(|t| !self.is_known_tag(t)) {
            patterns.insert(format!("{prefix}:{tag}:*"));
        }
        patterns
    }

    /// Removes every entry under the configured prefix.
    pub async fn clear_all(&self) -> Result<u64, CacheError> {
        let removed = self
            .store
            .forget_matching(&format!("{}:*", self.config.prefix))
            .await?;
        self.stats.record_invalidations(removed);
        Ok(removed)
    }

    #[must_use]
    pub fn get_stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn get_info(&self) -> CacheInfo {
        CacheInfo {
            enabled: self.config.enabled,
            driver: self.store.driver().to_string(),
            prefix: self.config.prefix.clone(),
            store_class: self.store.store_class().to_string(),
            supports_tags: self.store.supports_tags(),
            default_ttl_seconds: self.config.default_ttl_seconds,
        }
    }
}

fn params_are_empty(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use serde_json::json;

    fn service(store: MemoryCacheStore, enabled: bool) -> CacheService {
        let config = CacheConfig {
            enabled,
            ..CacheConfig::default()
        };
        CacheService::new(Arc::new(store), config, CacheStats::default())
    }

    #[test]
    fn test_key_is_deterministic() {
        let cache = service(MemoryCacheStore::new(), true);

        assert_eq!(cache.key("roles", "all", &json!({})), "cms:roles:all");
        let a = cache.key("content", "page", &json!({"slug": "about"}));
        let b = cache.key("content", "page", &json!({"slug": "about"}));
        let c = cache.key("content", "page", &json!({"slug": "contact"}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("cms:content:page:"));
    }

    #[tokio::test]
    async fn test_get_put_counts_hits_and_misses() {
        let cache = service(MemoryCacheStore::new(), true);

        assert!(cache.get("roles", "all", &Value::Null).await.is_none());
        assert!(cache.put("roles", "all", &json!(["admin"]), &Value::Null, false).await);
        assert_eq!(
            cache.get("roles", "all", &Value::Null).await,
            Some(json!(["admin"]))
        );

        let stats = cache.get_stats();
        assert_eq!((stats.hits, stats.misses, stats.writes), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_disabled_cache_bypasses_reads_and_writes() {
        let cache = service(MemoryCacheStore::new(), false);

        assert!(!cache.put("roles", "all", &json!(1), &Value::Null, false).await);
        assert!(cache.get("roles", "all", &Value::Null).await.is_none());

        assert!(cache.put("roles", "all", &json!(1), &Value::Null, true).await);
        assert!(cache.get("roles", "all", &Value::Null).await.is_none());
        assert_eq!(cache.get_stats().misses, 2);
    }

    #[tokio::test]
    async fn test_flush_falls_back_to_component_patterns() {
        let cache = service(MemoryCacheStore::without_tags(), true);
        cache.put("users", "all", &json!(1), &Value::Null, false).await;
        cache.put("roles", "all", &json!(2), &Value::Null, false).await;
        cache.put("media", "all", &json!(3), &Value::Null, false).await;

        let outcome = cache.flush_by_tags(&["permissions".to_string()]).await;

        assert_eq!(outcome.mode, FlushMode::Patterns);
        assert_eq!(outcome.removed, Some(2));
        assert!(outcome.is_complete());
        assert!(cache.get("users", "all", &Value::Null).await.is_none());
        assert_eq!(cache.get("media", "all", &Value::Null).await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_prefix() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = CacheService::new(store.clone(), CacheConfig::default(), CacheStats::default());
        cache.put("users", "all", &json!(1), &Value::Null, false).await;
        store.put("other:key", &json!(1), &[], None).await.unwrap();

        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}
