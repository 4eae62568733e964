use crate::db::timestamp;
use crate::entities::{prelude::*, search_analytics};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_searches: u64,
    pub successful_searches: u64,
    pub avg_execution_ms: f64,
    pub avg_results: f64,
}

impl AnalyticsSummary {
    /// Share of successful searches in percent, 0 when nothing was searched.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total_searches == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.successful_searches as f64 / self.total_searches as f64 * 100.0;
        rate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularQuery {
    pub query: String,
    pub searches: u64,
}

/// Append-only log of executed searches.
pub struct AnalyticsRepository {
    conn: DatabaseConnection,
}

impl AnalyticsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn record(
        &self,
        query: &str,
        results_count: i32,
        execution_time_ms: i64,
        successful: bool,
        searched_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        let active_model = search_analytics::ActiveModel {
            query: Set(query.to_string()),
            results_count: Set(results_count),
            execution_time_ms: Set(execution_time_ms),
            searched_at: Set(timestamp(searched_at)),
            successful: Set(successful),
            ..Default::default()
        };

        SearchAnalytics::insert(active_model)
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn count_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        SearchAnalytics::find()
            .filter(search_analytics::Column::SearchedAt.lt(timestamp(cutoff)))
            .count(&self.conn)
            .await
    }

    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = SearchAnalytics::delete_many()
            .filter(search_analytics::Column::SearchedAt.lt(timestamp(cutoff)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn summary_since(&self, since: DateTime<Utc>) -> Result<AnalyticsSummary, DbErr> {
        let since = timestamp(since);

        let total_searches = SearchAnalytics::find()
            .filter(search_analytics::Column::SearchedAt.gte(since.as_str()))
            .count(&self.conn)
            .await?;

        let successful_searches = SearchAnalytics::find()
            .filter(search_analytics::Column::SearchedAt.gte(since.as_str()))
            .filter(search_analytics::Column::Successful.eq(true))
            .count(&self.conn)
            .await?;

        let averages: Option<(Option<f64>, Option<f64>)> = SearchAnalytics::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(
                    search_analytics::Column::ExecutionTimeMs,
                ))),
                "avg_execution_ms",
            )
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(
                    search_analytics::Column::ResultsCount,
                ))),
                "avg_results",
            )
            .filter(search_analytics::Column::SearchedAt.gte(since.as_str()))
            .into_tuple()
            .one(&self.conn)
            .await?;

        let (avg_execution_ms, avg_results) = averages.unwrap_or((None, None));

        Ok(AnalyticsSummary {
            total_searches,
            successful_searches,
            avg_execution_ms: avg_execution_ms.unwrap_or(0.0),
            avg_results: avg_results.unwrap_or(0.0),
        })
    }

    pub async fn popular_since(
        &self,
        since: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PopularQuery>, DbErr> {
        let rows: Vec<(String, i64)> = SearchAnalytics::find()
            .select_only()
            .column(search_analytics::Column::Query)
            .column_as(Expr::col(search_analytics::Column::Id).count(), "searches")
            .filter(search_analytics::Column::SearchedAt.gte(timestamp(since)))
            .group_by(search_analytics::Column::Query)
            .order_by_desc(Expr::cust("searches"))
            .order_by_asc(search_analytics::Column::Query)
            .limit(limit)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(query, searches)| PopularQuery {
                query,
                searches: u64::try_from(searches).unwrap_or(0),
            })
            .collect())
    }
}
