//! Repository for the `operation_defects` ledger.
//!
//! Methods are generic over [`PgExecutor`] so reads can use the pool while
//! writes join the caller's transaction.

use pchart_core::defect::DefectQuantities;
use pchart_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::defect::OperationDefect;

/// Column list for `operation_defects` queries.
const COLUMNS: &str = "id, operation_id, defect_id, quantity, quantity_rework, \
                       quantity_nogood, quantity_replacement, created_at, updated_at";

/// Provides CRUD operations for ledger entries.
pub struct OperationDefectRepo;

impl OperationDefectRepo {
    /// Find a ledger entry by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<OperationDefect>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM operation_defects WHERE id = $1");
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the entry for one master defect within one operation.
    pub async fn find_by_operation_and_defect<'e, E: PgExecutor<'e>>(
        executor: E,
        operation_id: DbId,
        defect_id: DbId,
    ) -> Result<Option<OperationDefect>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM operation_defects \
             WHERE operation_id = $1 AND defect_id = $2"
        );
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(operation_id)
            .bind(defect_id)
            .fetch_optional(executor)
            .await
    }

    /// The full ledger of one operation.
    pub async fn list_for_operation<'e, E: PgExecutor<'e>>(
        executor: E,
        operation_id: DbId,
    ) -> Result<Vec<OperationDefect>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM operation_defects \
             WHERE operation_id = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(operation_id)
            .fetch_all(executor)
            .await
    }

    /// Every ledger entry across all operations of an order.
    pub async fn list_for_order(
        pool: &PgPool,
        production_order_id: DbId,
    ) -> Result<Vec<OperationDefect>, sqlx::Error> {
        sqlx::query_as::<_, OperationDefect>(
            "SELECT d.id, d.operation_id, d.defect_id, d.quantity, d.quantity_rework, \
                    d.quantity_nogood, d.quantity_replacement, d.created_at, d.updated_at \
             FROM operation_defects d \
             JOIN operations o ON o.id = d.operation_id \
             WHERE o.production_order_id = $1 \
             ORDER BY o.sequence_index ASC, d.id ASC",
        )
        .bind(production_order_id)
        .fetch_all(pool)
        .await
    }

    /// Insert a new entry. Fails with a unique violation on
    /// `uq_operation_defects_operation_defect` if the defect is already
    /// recorded on the operation.
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        operation_id: DbId,
        defect_id: DbId,
        quantities: &DefectQuantities,
    ) -> Result<OperationDefect, sqlx::Error> {
        let query = format!(
            "INSERT INTO operation_defects \
                (operation_id, defect_id, quantity, quantity_rework, quantity_nogood, \
                 quantity_replacement) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(operation_id)
            .bind(defect_id)
            .bind(quantities.quantity)
            .bind(quantities.quantity_rework)
            .bind(quantities.quantity_nogood)
            .bind(quantities.quantity_replacement)
            .fetch_one(executor)
            .await
    }

    /// Insert or overwrite the entry for `(operation_id, defect_id)`.
    pub async fn upsert<'e, E: PgExecutor<'e>>(
        executor: E,
        operation_id: DbId,
        defect_id: DbId,
        quantities: &DefectQuantities,
    ) -> Result<OperationDefect, sqlx::Error> {
        let query = format!(
            "INSERT INTO operation_defects \
                (operation_id, defect_id, quantity, quantity_rework, quantity_nogood, \
                 quantity_replacement) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ON CONSTRAINT uq_operation_defects_operation_defect \
             DO UPDATE SET \
                quantity = EXCLUDED.quantity, \
                quantity_rework = EXCLUDED.quantity_rework, \
                quantity_nogood = EXCLUDED.quantity_nogood, \
                quantity_replacement = EXCLUDED.quantity_replacement \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(operation_id)
            .bind(defect_id)
            .bind(quantities.quantity)
            .bind(quantities.quantity_rework)
            .bind(quantities.quantity_nogood)
            .bind(quantities.quantity_replacement)
            .fetch_one(executor)
            .await
    }

    /// Overwrite the quantities of an existing entry.
    ///
    /// Returns `None` if the entry no longer exists.
    pub async fn update_quantities<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        quantities: &DefectQuantities,
    ) -> Result<Option<OperationDefect>, sqlx::Error> {
        let query = format!(
            "UPDATE operation_defects SET \
                quantity = $2, quantity_rework = $3, quantity_nogood = $4, \
                quantity_replacement = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OperationDefect>(&query)
            .bind(id)
            .bind(quantities.quantity)
            .bind(quantities.quantity_rework)
            .bind(quantities.quantity_nogood)
            .bind(quantities.quantity_replacement)
            .fetch_optional(executor)
            .await
    }

    /// Remove a ledger entry. Returns `true` if a row was deleted.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM operation_defects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
