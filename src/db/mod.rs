use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::analytics::{AnalyticsRepository, AnalyticsSummary, PopularQuery};
pub use repositories::cache::CacheRepository;
pub use repositories::entities::{EntityFilter, EntityRepository};
pub use repositories::locks::LockRepository;
pub use repositories::search_index::{IndexEntry, SearchIndexStore};

/// Formats a timestamp the way every table stores it.
///
/// Fixed-width RFC 3339 in UTC so string comparison orders chronologically.
#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    #[must_use]
    pub fn entities(&self) -> EntityRepository {
        EntityRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn search_index(&self) -> SearchIndexStore {
        SearchIndexStore::new(self.conn.clone())
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsRepository {
        AnalyticsRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn cache_rows(&self) -> CacheRepository {
        CacheRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn locks(&self) -> LockRepository {
        LockRepository::new(self.conn.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_is_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let late = early + chrono::Duration::milliseconds(1500);

        assert_eq!(timestamp(early), "2026-01-02T03:04:05.000Z");
        assert_eq!(timestamp(late), "2026-01-02T03:04:06.500Z");
        assert!(timestamp(early) < timestamp(late));
    }
}
