use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MaintenanceLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaintenanceLocks::Name)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MaintenanceLocks::Owner).string().not_null())
                    .col(ColumnDef::new(MaintenanceLocks::AcquiredAt).string().not_null())
                    .col(ColumnDef::new(MaintenanceLocks::ExpiresAt).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaintenanceLocks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MaintenanceLocks {
    Table,
    Name,
    Owner,
    AcquiredAt,
    ExpiresAt,
}
