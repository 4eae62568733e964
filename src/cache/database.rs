use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::store::CacheStore;
use super::CacheError;
use crate::db::repositories::cache::CacheRepository;
use crate::db::timestamp;

/// Cache driver backed by the `cache_entries` / `cache_entry_tags` tables.
pub struct DatabaseCacheStore {
    rows: CacheRepository,
}

impl DatabaseCacheStore {
    #[must_use]
    pub const fn new(rows: CacheRepository) -> Self {
        Self { rows }
    }
}

/// Glob to SQL `LIKE` with `\` as the escape character.
fn glob_to_like(pattern: &str) -> String {
    let mut like = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '*' => like.push('%'),
            '%' | '_' | '\\' => {
                like.push('\\');
                like.push(c);
            }
            _ => like.push(c),
        }
    }
    like
}

#[async_trait]
impl CacheStore for DatabaseCacheStore {
    fn driver(&self) -> &'static str {
        "database"
    }

    fn store_class(&self) -> &'static str {
        "DatabaseCacheStore"
    }

    fn supports_tags(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        match self.rows.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &str,
        value: &Value,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .map(timestamp);

        self.rows
            .put(key, serde_json::to_string(value)?, tags, expires_at)
            .await?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.rows.delete_keys(&[key.to_string()]).await? > 0)
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<Option<u64>, CacheError> {
        let keys = self.rows.keys_tagged(tags).await?;
        Ok(Some(self.rows.delete_keys(&keys).await?))
    }

    async fn forget_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        Ok(self.rows.delete_like(&glob_to_like(pattern)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_to_like_escapes_sql_wildcards() {
        assert_eq!(glob_to_like("cms:users:*"), "cms:users:%");
        assert_eq!(glob_to_like("cms:page_views:*"), "cms:page\\_views:%");
        assert_eq!(glob_to_like("100%*"), "100\\%%");
    }
}
