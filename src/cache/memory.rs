use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::store::{CacheStore, glob_regex};
use super::CacheError;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    tags: Vec<String>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process-local store, mainly for single-shot CLI runs and tests.
///
/// Built with [`MemoryCacheStore::without_tags`] it behaves like a plain
/// key/value driver and refuses tag flushes.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    tags_supported: bool,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tags_supported: true,
        }
    }

    #[must_use]
    pub fn without_tags() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tags_supported: false,
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn driver(&self) -> &'static str {
        "memory"
    }

    fn store_class(&self) -> &'static str {
        "MemoryCacheStore"
    }

    fn supports_tags(&self) -> bool {
        self.tags_supported
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn put(
        &self,
        key: &str,
        value: &Value,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value: value.clone(),
            tags: if self.tags_supported {
                tags.to_vec()
            } else {
                Vec::new()
            },
            // A TTL past the clock's range never expires.
            expires_at: ttl.and_then(|ttl| Instant::now().checked_add(ttl)),
        };

        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<Option<u64>, CacheError> {
        if !self.tags_supported {
            return Err(CacheError::TagsUnsupported(self.driver()));
        }

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| tags.contains(t)));

        Ok(Some((before - entries.len()) as u64))
    }

    async fn forget_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let re = glob_regex(pattern)?;

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !re.is_match(key));

        Ok((before - entries.len()) as u64)
    }
}
