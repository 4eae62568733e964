use crate::db::timestamp;
use crate::entities::{prelude::*, search_index};
use crate::models::EntityKind;
use sea_orm::sea_query::{Alias, Expr, OnConflict, Query};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the search index as produced by a reindex pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub kind: EntityKind,
    pub searchable_id: i64,
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub category: String,
}

impl IndexEntry {
    fn into_active_model(self, indexed_at: &str) -> search_index::ActiveModel {
        search_index::ActiveModel {
            searchable_type: Set(self.kind.as_str().to_string()),
            searchable_id: Set(self.searchable_id),
            title: Set(self.title),
            content: Set(self.content),
            keywords: Set(self.keywords.join(" ")),
            category: Set(self.category),
            indexed_at: Set(indexed_at.to_string()),
            ..Default::default()
        }
    }
}

pub struct SearchIndexStore {
    conn: DatabaseConnection,
}

impl SearchIndexStore {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count_by_type(&self, kind: EntityKind) -> Result<u64, DbErr> {
        SearchIndex::find()
            .filter(search_index::Column::SearchableType.eq(kind.as_str()))
            .count(&self.conn)
            .await
    }

    pub async fn total(&self) -> Result<u64, DbErr> {
        SearchIndex::find().count(&self.conn).await
    }

    /// Index row counts grouped by `searchable_type`.
    pub async fn counts_by_type(&self) -> Result<BTreeMap<String, u64>, DbErr> {
        let rows: Vec<(String, i64)> = SearchIndex::find()
            .select_only()
            .column(search_index::Column::SearchableType)
            .column_as(Expr::col(search_index::Column::Id).count(), "total")
            .group_by(search_index::Column::SearchableType)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(kind, total)| (kind, u64::try_from(total).unwrap_or(0)))
            .collect())
    }

    /// Upserts a batch in its own transaction.
    ///
    /// Each batch stands alone: an interrupted reindex leaves earlier batches
    /// valid and the next run overwrites whatever it touches again.
    pub async fn bulk_replace(&self, entries: Vec<IndexEntry>) -> Result<u64, DbErr> {
        if entries.is_empty() {
            return Ok(0);
        }

        let written = entries.len() as u64;
        let indexed_at = timestamp(chrono::Utc::now());
        let models: Vec<_> = entries
            .into_iter()
            .map(|e| e.into_active_model(&indexed_at))
            .collect();

        let txn = self.conn.begin().await?;

        SearchIndex::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    search_index::Column::SearchableType,
                    search_index::Column::SearchableId,
                ])
                .update_columns([
                    search_index::Column::Title,
                    search_index::Column::Content,
                    search_index::Column::Keywords,
                    search_index::Column::Category,
                    search_index::Column::IndexedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        Ok(written)
    }

    fn orphan_condition(kind: EntityKind) -> Condition {
        let owners = Query::select()
            .column(Alias::new("id"))
            .from(Alias::new(kind.table_name()))
            .to_owned();

        Condition::all()
            .add(search_index::Column::SearchableType.eq(kind.as_str()))
            .add(search_index::Column::SearchableId.not_in_subquery(owners))
    }

    pub async fn count_orphans(&self, kind: EntityKind) -> Result<u64, DbErr> {
        SearchIndex::find()
            .filter(Self::orphan_condition(kind))
            .count(&self.conn)
            .await
    }

    /// Removes entries whose owner row no longer exists, as one anti-join
    /// delete against the owner table.
    pub async fn delete_orphans(&self, kind: EntityKind) -> Result<u64, DbErr> {
        let result = SearchIndex::delete_many()
            .filter(Self::orphan_condition(kind))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Entries matching every term in title, keywords or content.
    pub async fn search(
        &self,
        terms: &[String],
        limit: u64,
    ) -> Result<Vec<search_index::Model>, DbErr> {
        let mut condition = Condition::all();
        for term in terms {
            condition = condition.add(
                Condition::any()
                    .add(search_index::Column::Title.contains(term.as_str()))
                    .add(search_index::Column::Keywords.contains(term.as_str()))
                    .add(search_index::Column::Content.contains(term.as_str())),
            );
        }

        SearchIndex::find()
            .filter(condition)
            .order_by_asc(search_index::Column::Title)
            .order_by_asc(search_index::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
    }
}
