use chrono::Duration;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::Store;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Lock '{name}' is held by {owner} until {expires_at}, try again later")]
    Held {
        name: String,
        owner: String,
        expires_at: String,
    },

    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Lease on a named row in `maintenance_locks`.
///
/// Held for the duration of a reindex or cleanup so two invocations never
/// write the same tables at once. A crashed holder's lease lapses after its
/// TTL. Call [`AdvisoryLock::release`] when done.
pub struct AdvisoryLock {
    store: Store,
    name: String,
    owner: String,
}

impl AdvisoryLock {
    /// Fails with [`LockError::Held`] while another owner's lease is live.
    pub async fn acquire(store: &Store, name: &str, ttl: Duration) -> Result<Self, LockError> {
        let owner = Uuid::new_v4().to_string();
        let locks = store.locks();

        if !locks.try_acquire(name, &owner, ttl).await? {
            // The holder may release between the two queries.
            let (owner, expires_at) = match locks.holder(name).await? {
                Some(holder) => (holder.owner, holder.expires_at),
                None => ("another process".to_string(), "now".to_string()),
            };
            return Err(LockError::Held {
                name: name.to_string(),
                owner,
                expires_at,
            });
        }

        debug!(lock = name, owner = %owner, "Acquired advisory lock");
        Ok(Self {
            store: store.clone(),
            name: name.to_string(),
            owner,
        })
    }

    pub async fn release(self) {
        match self.store.locks().release(&self.name, &self.owner).await {
            Ok(true) => debug!(lock = %self.name, "Released advisory lock"),
            Ok(false) => warn!(lock = %self.name, "Advisory lock expired before release"),
            Err(e) => warn!(lock = %self.name, error = %e, "Failed to release advisory lock"),
        }
    }
}
