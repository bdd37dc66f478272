//! Advisory edit locks stored on `production_orders`.
//!
//! A lock is the `editing_user_id`, `editing_user_name`, `locked_at` triple.
//! Locks do not expire; they end on release by the holder or an admin
//! force-release.

use pchart_core::lock::LockInfo;
use pchart_core::types::{DbId, Timestamp};
use sqlx::{FromRow, PgPool};

use crate::models::production_order::ProductionOrder;
use crate::repositories::production_order_repo::COLUMNS;

/// The holder columns as they were before a force-release.
#[derive(Debug, Clone, FromRow)]
struct PreviousHolder {
    id: DbId,
    editing_user_id: Option<DbId>,
    editing_user_name: Option<String>,
    locked_at: Option<Timestamp>,
}

/// Provides lock transitions on production orders.
pub struct OrderLockRepo;

impl OrderLockRepo {
    /// Take the lock if nobody holds it.
    ///
    /// The `editing_user_id IS NULL` guard makes this a compare-and-set:
    /// of two concurrent callers at most one gets a row back. `None` means
    /// the order is missing or already locked; the caller re-reads to tell
    /// which.
    pub async fn try_lock(
        pool: &PgPool,
        order_number: &str,
        user_id: DbId,
        user_name: &str,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE production_orders \
             SET editing_user_id = $2, editing_user_name = $3, locked_at = NOW() \
             WHERE order_number = $1 AND editing_user_id IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(order_number)
            .bind(user_id)
            .bind(user_name)
            .fetch_optional(pool)
            .await
    }

    /// Release a lock held by `user_id`.
    ///
    /// Returns `true` if the caller held the lock and it was cleared,
    /// `false` otherwise.
    pub async fn release(
        pool: &PgPool,
        order_number: &str,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE production_orders \
             SET editing_user_id = NULL, editing_user_name = NULL, locked_at = NULL \
             WHERE order_number = $1 AND editing_user_id = $2",
        )
        .bind(order_number)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the lock regardless of holder.
    ///
    /// Returns `None` if the order does not exist, otherwise the order id
    /// and the holder that was removed (`None` if it was not locked).
    pub async fn force_release(
        pool: &PgPool,
        order_number: &str,
    ) -> Result<Option<(DbId, Option<LockInfo>)>, sqlx::Error> {
        // The CTE reads the pre-update row; RETURNING alone would only see
        // the cleared columns.
        let previous = sqlx::query_as::<_, PreviousHolder>(
            "WITH previous AS ( \
                 SELECT id, editing_user_id, editing_user_name, locked_at \
                 FROM production_orders WHERE order_number = $1 FOR UPDATE \
             ), cleared AS ( \
                 UPDATE production_orders p \
                 SET editing_user_id = NULL, editing_user_name = NULL, locked_at = NULL \
                 FROM previous WHERE p.id = previous.id \
                 RETURNING p.id \
             ) \
             SELECT id, editing_user_id, editing_user_name, locked_at FROM previous",
        )
        .bind(order_number)
        .fetch_optional(pool)
        .await?;

        Ok(previous.map(|row| {
            let holder = match (row.editing_user_id, row.locked_at) {
                (Some(user_id), Some(locked_at)) => Some(LockInfo {
                    user_id,
                    user_name: row.editing_user_name.unwrap_or_default(),
                    locked_at,
                }),
                _ => None,
            };
            (row.id, holder)
        }))
    }
}
