use serde::Serialize;
use tracing::{info, warn};

use super::service::CacheService;
use super::CacheError;

/// One item of a `cms:cache:clear` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    All,
    Component(String),
    Tag(String),
}

impl ClearTarget {
    /// Expands the command-line selectors into targets.
    ///
    /// `--all` wins over anything else; no selector at all means `All`.
    #[must_use]
    pub fn resolve(all: bool, components: &[String], tags: &[String]) -> Vec<Self> {
        if all {
            return vec![Self::All];
        }

        let split = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut targets: Vec<Self> = split(components)
            .into_iter()
            .map(Self::Component)
            .collect();
        targets.extend(split(tags).into_iter().map(Self::Tag));

        if targets.is_empty() {
            targets.push(Self::All);
        }
        targets
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Component(name) => format!("component:{name}"),
            Self::Tag(name) => format!("tag:{name}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearItemResult {
    pub label: String,
    pub tags: Vec<String>,
    pub removed: Option<u64>,
    pub error: Option<String>,
}

impl ClearItemResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearReport {
    pub items: Vec<ClearItemResult>,
}

impl ClearReport {
    #[must_use]
    pub fn cleared(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.len() - self.cleared()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!("Cleared: {}, Failed: {}", self.cleared(), self.failed())
    }
}

/// Resolves clear targets to tag lists and flushes them one by one.
pub struct CacheClearer<'a> {
    cache: &'a CacheService,
}

impl<'a> CacheClearer<'a> {
    #[must_use]
    pub const fn new(cache: &'a CacheService) -> Self {
        Self { cache }
    }

    /// Flushes every target, continuing past failures.
    pub async fn clear(&self, targets: &[ClearTarget]) -> ClearReport {
        let mut report = ClearReport::default();

        for target in targets {
            let label = target.label();
            let tags = match self.tags_for(target) {
                Ok(tags) => tags,
                Err(error) => {
                    warn!(target = %label, "{}", error);
                    report.items.push(ClearItemResult {
                        label,
                        tags: Vec::new(),
                        removed: None,
                        error: Some(error.to_string()),
                    });
                    continue;
                }
            };

            let outcome = self.cache.flush_by_tags(&tags).await;
            let error = (!outcome.is_complete())
                .then(|| CacheError::PatternsFailed(outcome.failed_patterns.clone()).to_string());

            if error.is_none() {
                info!(target = %label, tags = ?tags, removed = ?outcome.removed, "Cache cleared");
            }

            report.items.push(ClearItemResult {
                label,
                tags,
                removed: outcome.removed,
                error,
            });
        }

        report
    }

    fn tags_for(&self, target: &ClearTarget) -> Result<Vec<String>, CacheError> {
        match target {
            ClearTarget::All => Ok(self.cache.known_tags()),
            ClearTarget::Component(name) => self
                .cache
                .component_tags(name)
                .map(<[String]>::to_vec)
                .ok_or_else(|| CacheError::UnknownComponent(name.clone())),
            ClearTarget::Tag(name) => {
                if self.cache.is_known_tag(name) {
                    Ok(vec![name.clone()])
                } else {
                    Err(CacheError::UnknownTag(name.clone()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, MemoryCacheStore};
    use crate::config::CacheConfig;
    use std::sync::Arc;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resolve_selectors() {
        assert_eq!(ClearTarget::resolve(false, &[], &[]), vec![ClearTarget::All]);
        assert_eq!(
            ClearTarget::resolve(true, &strings(&["users"]), &[]),
            vec![ClearTarget::All]
        );
        assert_eq!(
            ClearTarget::resolve(false, &strings(&["users,roles"]), &strings(&["media"])),
            vec![
                ClearTarget::Component("users".to_string()),
                ClearTarget::Component("roles".to_string()),
                ClearTarget::Tag("media".to_string()),
            ]
        );
    }

    #[test]
    fn test_report_counts() {
        let ok = ClearItemResult {
            label: "component:users".to_string(),
            tags: strings(&["users", "permissions"]),
            removed: Some(3),
            error: None,
        };
        let bad = ClearItemResult {
            label: "component:bogus".to_string(),
            tags: Vec::new(),
            removed: None,
            error: Some("Unknown cache component: bogus".to_string()),
        };

        let report = ClearReport {
            items: vec![ok, bad],
        };
        assert_eq!(report.summary(), "Cleared: 1, Failed: 1");
        assert!(!report.is_success());
    }

    #[test]
    fn test_unknown_targets_name_the_selector() {
        let cache = CacheService::new(
            Arc::new(MemoryCacheStore::new()),
            CacheConfig::default(),
            CacheStats::default(),
        );
        let clearer = CacheClearer::new(&cache);

        let err = clearer
            .tags_for(&ClearTarget::Component("bogus".to_string()))
            .unwrap_err();
        assert!(matches!(&err, CacheError::UnknownComponent(name) if name == "bogus"));
        assert_eq!(err.to_string(), "Unknown cache component: bogus");

        let err = clearer.tags_for(&ClearTarget::Tag("nope".to_string())).unwrap_err();
        assert!(matches!(err, CacheError::UnknownTag(_)));
        assert_eq!(
            clearer.tags_for(&ClearTarget::Tag("media".to_string())).unwrap(),
            vec!["media".to_string()]
        );
    }
}
