use crate::db::timestamp;
use crate::entities::{maintenance_locks, prelude::*};
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

/// Named leases in `maintenance_locks`.
///
/// A lease whose `expires_at` has passed is treated as abandoned and may be
/// taken over by the next caller.
pub struct LockRepository {
    conn: DatabaseConnection,
}

impl LockRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn try_acquire(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool, DbErr> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DbErr::Custom(format!("Lock TTL for '{name}' is out of range")))?;

        MaintenanceLocks::delete_many()
            .filter(maintenance_locks::Column::Name.eq(name))
            .filter(maintenance_locks::Column::ExpiresAt.lt(timestamp(now)))
            .exec(&self.conn)
            .await?;

        let active_model = maintenance_locks::ActiveModel {
            name: Set(name.to_string()),
            owner: Set(owner.to_string()),
            acquired_at: Set(timestamp(now)),
            expires_at: Set(timestamp(expires_at)),
        };

        let inserted = MaintenanceLocks::insert(active_model)
            .on_conflict(
                OnConflict::column(maintenance_locks::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(inserted == 1)
    }

    pub async fn release(&self, name: &str, owner: &str) -> Result<bool, DbErr> {
        let result = MaintenanceLocks::delete_many()
            .filter(maintenance_locks::Column::Name.eq(name))
            .filter(maintenance_locks::Column::Owner.eq(owner))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn holder(&self, name: &str) -> Result<Option<maintenance_locks::Model>, DbErr> {
        MaintenanceLocks::find_by_id(name.to_string())
            .one(&self.conn)
            .await
    }
}
