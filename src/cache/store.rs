use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::time::Duration;

use super::CacheError;

/// Key/value backend with optional tag support.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Driver name as configured, e.g. `database`.
    fn driver(&self) -> &'static str;

    fn store_class(&self) -> &'static str;

    fn supports_tags(&self) -> bool;

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    async fn put(
        &self,
        key: &str,
        value: &Value,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    async fn forget(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every entry carrying any of `tags`.
    ///
    /// `Ok(None)` means the flush happened but the backend cannot say how
    /// many entries went away. Stores without tag support return
    /// [`CacheError::TagsUnsupported`].
    async fn flush_tags(&self, tags: &[String]) -> Result<Option<u64>, CacheError>;

    /// Removes every key matching a glob where `*` matches any run of
    /// characters.
    async fn forget_matching(&self, pattern: &str) -> Result<u64, CacheError>;
}

pub(crate) fn glob_regex(pattern: &str) -> Result<Regex, CacheError> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{body}$")).map_err(|e| CacheError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_regex_matches_prefix_wildcards() {
        let re = glob_regex("cms:users:*").unwrap();
        assert!(re.is_match("cms:users:all"));
        assert!(re.is_match("cms:users:profile:00ff"));
        assert!(!re.is_match("cms:roles:all"));
        assert!(!re.is_match("xcms:users:all"));
    }

    #[test]
    fn test_glob_regex_escapes_metacharacters() {
        let re = glob_regex("cms:a.b:*").unwrap();
        assert!(re.is_match("cms:a.b:x"));
        assert!(!re.is_match("cms:aXb:x"));
    }
}
