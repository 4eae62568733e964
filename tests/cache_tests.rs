//! Cache service, clear and warm workflows across both drivers.

mod common;

use async_trait::async_trait;
use cmsctl::cache::{
    CacheClearer, CacheError, CacheService, CacheStats, CacheStore, CacheWarmer, ClearTarget,
    FlushMode, MemoryCacheStore, WarmOptions,
};
use cmsctl::config::CacheConfig;
use common::{
    insert_content, insert_plugin, insert_role, insert_setting, insert_term, test_context,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Memory store that records every tag flush it receives.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryCacheStore,
    flushes: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl CacheStore for RecordingStore {
    fn driver(&self) -> &'static str {
        "recording"
    }

    fn store_class(&self) -> &'static str {
        "RecordingStore"
    }

    fn supports_tags(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.inner.get(key).await
    }

    async fn put(
        &self,
        key: &str,
        value: &Value,
        tags: &[String],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.inner.put(key, value, tags, ttl).await
    }

    async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.forget(key).await
    }

    async fn flush_tags(&self, tags: &[String]) -> Result<Option<u64>, CacheError> {
        self.flushes.lock().unwrap().push(tags.to_vec());
        self.inner.flush_tags(tags).await
    }

    async fn forget_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        self.inner.forget_matching(pattern).await
    }
}

fn service_with(store: Arc<dyn CacheStore>) -> CacheService {
    CacheService::new(store, CacheConfig::default(), CacheStats::default())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn clearing_a_component_flushes_its_tags_once() {
    let store = Arc::new(RecordingStore::default());
    let cache = service_with(store.clone());
    cache.put("users", "all", &json!([1]), &Value::Null, false).await;

    let targets = ClearTarget::resolve(false, &strings(&["users"]), &[]);
    let report = CacheClearer::new(&cache).clear(&targets).await;

    assert_eq!(
        *store.flushes.lock().unwrap(),
        vec![strings(&["users", "permissions"])]
    );
    assert_eq!(report.summary(), "Cleared: 1, Failed: 0");
    assert!(report.is_success());
    assert!(cache.get("users", "all", &Value::Null).await.is_none());
}

#[tokio::test]
async fn unknown_component_is_an_item_failure() {
    let store = Arc::new(RecordingStore::default());
    let cache = service_with(store.clone());

    let targets = ClearTarget::resolve(false, &strings(&["bogus"]), &[]);
    let report = CacheClearer::new(&cache).clear(&targets).await;

    assert_eq!(report.summary(), "Cleared: 0, Failed: 1");
    assert!(!report.is_success());
    assert!(store.flushes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mixed_targets_continue_past_failures() {
    let cache = service_with(Arc::new(MemoryCacheStore::new()));

    let targets = ClearTarget::resolve(
        false,
        &strings(&["roles", "widgets"]),
        &strings(&["media", "nope"]),
    );
    let report = CacheClearer::new(&cache).clear(&targets).await;

    assert_eq!(report.summary(), "Cleared: 2, Failed: 2");
}

#[tokio::test]
async fn tag_flush_invalidates_entries_of_every_component() {
    for driver in ["database", "memory"] {
        let ctx = test_context(|config| config.cache.driver = driver.to_string()).await;
        let cache = &ctx.cache;

        cache.put("users", "all", &json!([1]), &Value::Null, false).await;
        cache
            .put("roles", "by_name", &json!({"id": 2}), &json!({"name": "editor"}), false)
            .await;
        cache.put("media", "recent", &json!([]), &Value::Null, false).await;

        let outcome = cache.flush_by_tags(&strings(&["permissions"])).await;
        assert_eq!(outcome.mode, FlushMode::Tags, "{driver}");
        assert_eq!(outcome.removed, Some(2), "{driver}");

        assert!(cache.get("users", "all", &Value::Null).await.is_none());
        assert!(
            cache
                .get("roles", "by_name", &json!({"name": "editor"}))
                .await
                .is_none()
        );
        assert_eq!(
            cache.get("media", "recent", &Value::Null).await,
            Some(json!([]))
        );
        assert_eq!(cache.get_stats().invalidations, 2);
    }
}

#[tokio::test]
async fn untagged_store_falls_back_to_patterns() {
    let cache = service_with(Arc::new(MemoryCacheStore::without_tags()));
    cache.put("plugins", "active", &json!(["seo"]), &Value::Null, false).await;
    cache.put("themes", "current", &json!("dark"), &Value::Null, false).await;
    cache.put("content", "home", &json!("x"), &Value::Null, false).await;

    let report = CacheClearer::new(&cache)
        .clear(&[ClearTarget::Tag("settings".to_string())])
        .await;

    assert!(report.is_success());
    assert_eq!(report.items[0].removed, Some(2));
    assert!(cache.get("plugins", "active", &Value::Null).await.is_none());
    assert_eq!(
        cache.get("content", "home", &Value::Null).await,
        Some(json!("x"))
    );
}

#[tokio::test]
async fn disabled_cache_bypasses_reads_and_writes() {
    let ctx = test_context(|config| config.cache.enabled = false).await;

    assert!(!ctx.cache.put("roles", "all", &json!([1]), &Value::Null, false).await);
    assert!(ctx.cache.get("roles", "all", &Value::Null).await.is_none());

    let stats = ctx.cache.get_stats();
    assert_eq!((stats.hits, stats.misses, stats.writes), (0, 1, 0));
    assert!(!ctx.cache.get_info().enabled);
}

#[tokio::test]
async fn warm_populates_named_items() {
    let ctx = test_context(|_| {}).await;
    insert_role(&ctx.store, "admin").await;
    insert_role(&ctx.store, "editor").await;
    insert_setting(&ctx.store, "site_name", "Example").await;
    insert_plugin(&ctx.store, "seo", true).await;
    insert_plugin(&ctx.store, "legacy", false).await;
    insert_term(&ctx.store, "category", "News").await;
    insert_term(&ctx.store, "tag", "Rust").await;
    for i in 0..5 {
        insert_content(&ctx.store, &format!("Post {i}"), "Body", "published").await;
    }
    insert_content(&ctx.store, "Draft", "Body", "draft").await;

    let options = WarmOptions {
        chunk_size: 2,
        delay: Duration::ZERO,
        force: false,
    };
    let results = CacheWarmer::new(ctx.store.clone(), &ctx.cache)
        .warm(
            &strings(&[
                "all_roles",
                "all_settings",
                "active_plugins",
                "taxonomy_terms",
                "published_content",
                "everything",
            ]),
            &options,
        )
        .await;

    let written: Vec<(String, u64, bool)> = results
        .iter()
        .map(|r| (r.item.clone(), r.written, r.is_success()))
        .collect();
    assert_eq!(
        written,
        vec![
            ("all_roles".to_string(), 1, true),
            ("all_settings".to_string(), 1, true),
            ("active_plugins".to_string(), 1, true),
            ("taxonomy_terms".to_string(), 2, true),
            ("published_content".to_string(), 3, true),
            ("everything".to_string(), 0, false),
        ]
    );

    let roles = ctx.cache.get("roles", "all", &Value::Null).await.unwrap();
    assert_eq!(roles.as_array().map(Vec::len), Some(2));

    let plugins = ctx.cache.get("plugins", "active", &Value::Null).await.unwrap();
    assert_eq!(plugins[0]["name"], "seo");
    assert_eq!(plugins.as_array().map(Vec::len), Some(1));

    let settings = ctx.cache.get("settings", "all", &Value::Null).await.unwrap();
    assert_eq!(settings["site_name"], "Example");
}

#[tokio::test]
async fn warm_skips_disabled_cache_unless_forced() {
    let ctx = test_context(|config| config.cache.enabled = false).await;
    insert_role(&ctx.store, "admin").await;
    let warmer = CacheWarmer::new(ctx.store.clone(), &ctx.cache);

    let skipped = warmer
        .warm(&strings(&["all_roles"]), &WarmOptions::default())
        .await;
    assert!(!skipped[0].is_success());

    let forced = warmer
        .warm(
            &strings(&["all_roles"]),
            &WarmOptions {
                force: true,
                ..WarmOptions::default()
            },
        )
        .await;
    assert!(forced[0].is_success());
    assert_eq!(forced[0].written, 1);
}

#[tokio::test]
async fn undecodable_entry_is_dropped_on_read() {
    let ctx = test_context(|_| {}).await;
    let key = ctx.cache.key("users", "all", &Value::Null);
    ctx.store
        .cache_rows()
        .put(&key, "{not json".to_string(), &strings(&["users"]), None)
        .await
        .unwrap();

    assert!(ctx.cache.get("users", "all", &Value::Null).await.is_none());
    assert!(ctx.store.cache_rows().get(&key).await.unwrap().is_none());

    let stats = ctx.cache.get_stats();
    assert_eq!((stats.misses, stats.invalidations), (1, 1));
}
