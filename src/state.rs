use std::sync::Arc;

use crate::cache::{self, CacheService, CacheStats};
use crate::config::Config;
use crate::db::Store;
use crate::maintenance::MaintenanceOrchestrator;
use crate::search::SearchService;

/// Everything a command needs, wired once per invocation.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,

    pub store: Store,

    pub cache: Arc<CacheService>,
}

impl AppContext {
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Builds the context on an already migrated store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let backend = cache::store_for_driver(&config.cache, &store)?;
        let cache = Arc::new(CacheService::new(
            backend,
            config.cache.clone(),
            CacheStats::default(),
        ));

        Ok(Self {
            config,
            store,
            cache,
        })
    }

    #[must_use]
    pub fn search(&self) -> SearchService {
        SearchService::new(
            self.store.clone(),
            self.config.search.clone(),
            self.config.maintenance.lock_ttl(),
        )
    }

    #[must_use]
    pub fn maintenance(&self) -> MaintenanceOrchestrator {
        MaintenanceOrchestrator::new(self.store.clone(), self.cache.clone(), self.config.clone())
    }
}
