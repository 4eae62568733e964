use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::service::CacheService;
use super::CacheError;
use crate::db::{EntityFilter, Store};
use crate::models::{EntityKind, EntityRecord};

/// Named population routine run by `cms:cache:warm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmItem {
    AllRoles,
    AllSettings,
    ActivePlugins,
    TaxonomyTerms,
    PublishedContent,
}

impl WarmItem {
    pub const ALL: [Self; 5] = [
        Self::AllRoles,
        Self::AllSettings,
        Self::ActivePlugins,
        Self::TaxonomyTerms,
        Self::PublishedContent,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllRoles => "all_roles",
            Self::AllSettings => "all_settings",
            Self::ActivePlugins => "active_plugins",
            Self::TaxonomyTerms => "taxonomy_terms",
            Self::PublishedContent => "published_content",
        }
    }
}

impl fmt::Display for WarmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarmItem {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == s.trim())
            .ok_or_else(|| CacheError::UnknownItem(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct WarmOptions {
    pub chunk_size: u64,
    /// Pause between chunks of `published_content`
    pub delay: Duration,
    /// Write even when the cache is disabled
    pub force: bool,
}

impl Default for WarmOptions {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            delay: Duration::from_millis(100),
            force: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WarmItemResult {
    pub item: String,
    /// Cache entries written
    pub written: u64,
    pub error: Option<String>,
}

impl WarmItemResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub struct CacheWarmer<'a> {
    store: Store,
    cache: &'a CacheService,
}

impl<'a> CacheWarmer<'a> {
    #[must_use]
    pub const fn new(store: Store, cache: &'a CacheService) -> Self {
        Self { store, cache }
    }

    /// Runs each named item in order; one failing item never stops the rest.
    pub async fn warm(&self, items: &[String], options: &WarmOptions) -> Vec<WarmItemResult> {
        let mut results = Vec::with_capacity(items.len());

        for name in items {
            let result = match name.parse::<WarmItem>() {
                Ok(item) => match self.warm_item(item, options).await {
                    Ok(written) => {
                        info!(item = %item, written, "Cache item warmed");
                        WarmItemResult {
                            item: item.to_string(),
                            written,
                            error: None,
                        }
                    }
                    Err(error) => {
                        warn!(item = %item, error = %error, "Cache warm failed");
                        WarmItemResult {
                            item: item.to_string(),
                            written: 0,
                            error: Some(error.to_string()),
                        }
                    }
                },
                Err(error) => {
                    warn!(item = %name, "{}", error);
                    WarmItemResult {
                        item: name.clone(),
                        written: 0,
                        error: Some(error.to_string()),
                    }
                }
            };
            results.push(result);
        }

        results
    }

    async fn warm_item(&self, item: WarmItem, options: &WarmOptions) -> Result<u64, CacheError> {
        let repo = self.store.entities();
        let chunk = options.chunk_size.max(1);

        match item {
            WarmItem::AllRoles => {
                let roles = repo
                    .all(EntityKind::Role, chunk, None)
                    .await?;
                self.write("roles", "all", &attribute_list(&roles), &Value::Null, options)
                    .await
            }
            WarmItem::AllSettings => {
                let settings = repo
                    .all(EntityKind::Setting, chunk, None)
                    .await?;
                let map: serde_json::Map<String, Value> = settings
                    .into_iter()
                    .map(|s| (s.title, Value::String(s.body)))
                    .collect();
                self.write("settings", "all", &Value::Object(map), &Value::Null, options)
                    .await
            }
            WarmItem::ActivePlugins => {
                let filter = EntityFilter::eq("active", true);
                let plugins = repo
                    .all(EntityKind::Plugin, chunk, Some(&filter))
                    .await?;
                self.write("plugins", "active", &attribute_list(&plugins), &Value::Null, options)
                    .await
            }
            WarmItem::TaxonomyTerms => {
                let terms = repo
                    .all(EntityKind::Term, chunk, None)
                    .await?;

                let mut by_taxonomy: BTreeMap<String, Vec<Value>> = BTreeMap::new();
                for term in terms {
                    by_taxonomy
                        .entry(term.category.clone())
                        .or_default()
                        .push(term.attributes);
                }

                let mut written = 0;
                for (taxonomy, terms) in by_taxonomy {
                    written += self
                        .write(
                            "taxonomy",
                            "terms",
                            &Value::Array(terms),
                            &json!({ "taxonomy": taxonomy }),
                            options,
                        )
                        .await?;
                }
                Ok(written)
            }
            WarmItem::PublishedContent => self.warm_published_content(chunk, options).await,
        }
    }

    /// Pages through published content, one cache entry per page.
    async fn warm_published_content(&self, chunk: u64, options: &WarmOptions) -> Result<u64, CacheError> {
        let repo = self.store.entities();
        let filter = EntityFilter::eq("status", "published");
        let mut cursor = 0;
        let mut page = 1;
        let mut written = 0;

        loop {
            let rows = repo
                .chunk_after(EntityKind::Content, cursor, chunk, Some(&filter))
                .await?;
            let Some(last) = rows.last() else {
                break;
            };
            cursor = last.id;
            let done = (rows.len() as u64) < chunk;

            written += self
                .write(
                    "content",
                    "published",
                    &attribute_list(&rows),
                    &json!({ "page": page, "per_page": chunk }),
                    options,
                )
                .await?;
            debug!(page, rows = rows.len(), "Warmed published content page");

            if done {
                break;
            }
            page += 1;
            if !options.delay.is_zero() {
                tokio::time::sleep(options.delay).await;
            }
        }

        Ok(written)
    }

    async fn write(
        &self,
        component: &str,
        operation: &str,
        value: &Value,
        params: &Value,
        options: &WarmOptions,
    ) -> Result<u64, CacheError> {
        if self
            .cache
            .put(component, operation, value, params, options.force)
            .await
        {
            Ok(1)
        } else if !self.cache.is_enabled() && !options.force {
            Err(CacheError::Disabled)
        } else {
            Err(CacheError::WriteFailed {
                component: component.to_string(),
                operation: operation.to_string(),
            })
        }
    }
}

fn attribute_list(records: &[EntityRecord]) -> Value {
    Value::Array(records.iter().map(|r| r.attributes.clone()).collect())
}
