//! Repository for the `operations` table.

use pchart_core::types::{DbId, Quantity, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::operation::Operation;

/// Column list for `operations` queries.
const COLUMNS: &str = "id, production_order_id, operation_code, sequence_index, \
                       input_quantity, output_quantity, start_time, end_time, \
                       line_no, resource_factor, created_at, updated_at";

/// Provides reads and lifecycle updates for operations.
pub struct OperationRepo;

impl OperationRepo {
    /// Find an operation by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM operations WHERE id = $1");
        sqlx::query_as::<_, Operation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All operations of an order in sequence order.
    pub async fn list_for_order(
        pool: &PgPool,
        production_order_id: DbId,
    ) -> Result<Vec<Operation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM operations \
             WHERE production_order_id = $1 \
             ORDER BY sequence_index ASC"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(production_order_id)
            .fetch_all(pool)
            .await
    }

    /// All operations of an order in sequence order, row-locked for the
    /// rest of the transaction.
    pub async fn list_for_order_for_update(
        conn: &mut PgConnection,
        production_order_id: DbId,
    ) -> Result<Vec<Operation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM operations \
             WHERE production_order_id = $1 \
             ORDER BY sequence_index ASC \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(production_order_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Set `start_time` to now and record the input quantity.
    ///
    /// Guarded on `start_time IS NULL`; returns `None` if the operation was
    /// already started.
    pub async fn mark_started(
        conn: &mut PgConnection,
        id: DbId,
        input_quantity: Quantity,
    ) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!(
            "UPDATE operations SET start_time = NOW(), input_quantity = $2 \
             WHERE id = $1 AND start_time IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(id)
            .bind(input_quantity)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Record completion: output, end time, line and resource factor.
    ///
    /// Guarded on `end_time IS NULL`; returns `None` if the operation was
    /// already completed.
    pub async fn mark_completed(
        conn: &mut PgConnection,
        id: DbId,
        output_quantity: Quantity,
        end_time: Timestamp,
        line_no: &str,
        resource_factor: f64,
    ) -> Result<Option<Operation>, sqlx::Error> {
        let query = format!(
            "UPDATE operations \
             SET output_quantity = $2, end_time = $3, line_no = $4, resource_factor = $5 \
             WHERE id = $1 AND start_time IS NOT NULL AND end_time IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Operation>(&query)
            .bind(id)
            .bind(output_quantity)
            .bind(end_time)
            .bind(line_no)
            .bind(resource_factor)
            .fetch_optional(&mut *conn)
            .await
    }
}
