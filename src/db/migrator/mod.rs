use sea_orm_migration::prelude::*;

mod m20260301_create_content_tables;
mod m20260302_create_search_tables;
mod m20260305_create_cache_store;
mod m20260310_create_maintenance_locks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_content_tables::Migration),
            Box::new(m20260302_create_search_tables::Migration),
            Box::new(m20260305_create_cache_store::Migration),
            Box::new(m20260310_create_maintenance_locks::Migration),
        ]
    }
}
