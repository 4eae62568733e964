use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchIndex::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchIndex::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchIndex::SearchableType).string().not_null())
                    .col(ColumnDef::new(SearchIndex::SearchableId).integer().not_null())
                    .col(ColumnDef::new(SearchIndex::Title).string().not_null())
                    .col(ColumnDef::new(SearchIndex::Content).text().not_null())
                    .col(ColumnDef::new(SearchIndex::Keywords).text().not_null())
                    .col(ColumnDef::new(SearchIndex::Type).string().not_null())
                    .col(ColumnDef::new(SearchIndex::IndexedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // One row per owner; bulk replace upserts against this.
        manager
            .create_index(
                Index::create()
                    .name("idx_search_index_searchable")
                    .table(SearchIndex::Table)
                    .col(SearchIndex::SearchableType)
                    .col(SearchIndex::SearchableId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchAnalytics::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchAnalytics::Query).string().not_null())
                    .col(
                        ColumnDef::new(SearchAnalytics::ResultsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchAnalytics::ExecutionTimeMs)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SearchAnalytics::SearchedAt).string().not_null())
                    .col(
                        ColumnDef::new(SearchAnalytics::Successful)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_analytics_searched_at")
                    .table(SearchAnalytics::Table)
                    .col(SearchAnalytics::SearchedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchAnalytics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchIndex::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SearchIndex {
    Table,
    Id,
    SearchableType,
    SearchableId,
    Title,
    Content,
    Keywords,
    Type,
    IndexedAt,
}

#[derive(DeriveIden)]
enum SearchAnalytics {
    Table,
    Id,
    Query,
    ResultsCount,
    ExecutionTimeMs,
    SearchedAt,
    Successful,
}
