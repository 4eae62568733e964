use crate::db::timestamp;
use crate::entities::{cache_entries, cache_entry_tags, prelude::*};
use sea_orm::sea_query::{LikeExpr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

/// Rows behind the `database` cache driver.
pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the stored JSON for `key`, dropping it if it has expired.
    pub async fn get(&self, key: &str) -> Result<Option<String>, DbErr> {
        let Some(entry) = CacheEntries::find_by_id(key.to_string())
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let now = timestamp(chrono::Utc::now());
        if entry.expires_at.as_deref().is_some_and(|at| at <= now.as_str()) {
            self.delete_keys(&[entry.key]).await?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    pub async fn put(
        &self,
        key: &str,
        value: String,
        tags: &[String],
        expires_at: Option<String>,
    ) -> Result<(), DbErr> {
        let txn = self.conn.begin().await?;

        let active_model = cache_entries::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            expires_at: Set(expires_at),
        };

        CacheEntries::insert(active_model)
            .on_conflict(
                OnConflict::column(cache_entries::Column::Key)
                    .update_columns([cache_entries::Column::Value, cache_entries::Column::ExpiresAt])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        CacheEntryTags::delete_many()
            .filter(cache_entry_tags::Column::CacheKey.eq(key))
            .exec(&txn)
            .await?;

        if !tags.is_empty() {
            let tag_rows = tags.iter().map(|tag| cache_entry_tags::ActiveModel {
                cache_key: Set(key.to_string()),
                tag: Set(tag.clone()),
                ..Default::default()
            });
            CacheEntryTags::insert_many(tag_rows)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Distinct keys carrying any of `tags`.
    pub async fn keys_tagged(&self, tags: &[String]) -> Result<Vec<String>, DbErr> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        CacheEntryTags::find()
            .select_only()
            .column(cache_entry_tags::Column::CacheKey)
            .filter(cache_entry_tags::Column::Tag.is_in(tags.iter().cloned()))
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
    }

    /// Deletes entries and their tag rows; returns entries removed.
    pub async fn delete_keys(&self, keys: &[String]) -> Result<u64, DbErr> {
        if keys.is_empty() {
            return Ok(0);
        }

        let txn = self.conn.begin().await?;

        let result = CacheEntries::delete_many()
            .filter(cache_entries::Column::Key.is_in(keys.iter().cloned()))
            .exec(&txn)
            .await?;

        CacheEntryTags::delete_many()
            .filter(cache_entry_tags::Column::CacheKey.is_in(keys.iter().cloned()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    /// Deletes every entry whose key matches a SQL `LIKE` pattern escaped
    /// with `\`.
    pub async fn delete_like(&self, pattern: &str) -> Result<u64, DbErr> {
        let keys: Vec<String> = CacheEntries::find()
            .select_only()
            .column(cache_entries::Column::Key)
            .filter(cache_entries::Column::Key.like(LikeExpr::new(pattern).escape('\\')))
            .into_tuple()
            .all(&self.conn)
            .await?;

        self.delete_keys(&keys).await
    }
}
