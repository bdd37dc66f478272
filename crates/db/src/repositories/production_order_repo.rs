//! Repository for the `production_orders` table.

use pchart_core::production_order::OrderStatus;
use pchart_core::types::{DbId, Quantity};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::production_order::ProductionOrder;

/// Column list for `production_orders` queries.
pub(crate) const COLUMNS: &str = "id, order_number, lot_number, item_name, quantity, status, \
                                  current_operation, editing_user_id, editing_user_name, \
                                  locked_at, created_at, updated_at";

/// Provides CRUD operations for production orders.
pub struct ProductionOrderRepo;

impl ProductionOrderRepo {
    /// Insert an order together with one operation row per step.
    ///
    /// `steps` must be non-empty; the first step becomes the current
    /// operation. Both inserts share one transaction.
    pub async fn create_with_operations(
        pool: &PgPool,
        order_number: &str,
        lot_number: &str,
        item_name: &str,
        quantity: Quantity,
        steps: &[String],
    ) -> Result<ProductionOrder, sqlx::Error> {
        let first = steps.first().ok_or_else(|| {
            sqlx::Error::Protocol("a production order needs at least one operation step".into())
        })?;

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO production_orders
                (order_number, lot_number, item_name, quantity, status, current_operation)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(order_number)
            .bind(lot_number)
            .bind(item_name)
            .bind(quantity)
            .bind(OrderStatus::Pending.as_str())
            .bind(first)
            .fetch_one(&mut *tx)
            .await?;

        for (index, code) in steps.iter().enumerate() {
            sqlx::query(
                "INSERT INTO operations (production_order_id, operation_code, sequence_index)
                 VALUES ($1, $2, $3)",
            )
            .bind(order.id)
            .bind(code)
            .bind(index as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(
            order_id = order.id,
            order_number,
            operations = steps.len(),
            "Seeded production order operations"
        );
        Ok(order)
    }

    /// Find an order by its human-entered order number.
    pub async fn find_by_number(
        pool: &PgPool,
        order_number: &str,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM production_orders WHERE order_number = $1");
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(order_number)
            .fetch_optional(pool)
            .await
    }

    /// Find an order by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM production_orders WHERE id = $1");
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load an order and hold its row lock until the transaction ends.
    ///
    /// Every operation state change goes through this first, so concurrent
    /// start/complete calls on one order are applied one at a time.
    pub async fn find_by_number_for_update(
        conn: &mut PgConnection,
        order_number: &str,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM production_orders WHERE order_number = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(order_number)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Same as [`find_by_number_for_update`](Self::find_by_number_for_update), by id.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM production_orders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List orders, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<OrderStatus>,
    ) -> Result<Vec<ProductionOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM production_orders
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(status.map(OrderStatus::as_str))
            .fetch_all(pool)
            .await
    }

    /// Update descriptive fields. Only non-`None` values are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        lot_number: Option<&str>,
        item_name: Option<&str>,
        quantity: Option<Quantity>,
    ) -> Result<Option<ProductionOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE production_orders SET
                lot_number = COALESCE($2, lot_number),
                item_name = COALESCE($3, item_name),
                quantity = COALESCE($4, quantity)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(id)
            .bind(lot_number)
            .bind(item_name)
            .bind(quantity)
            .fetch_optional(executor)
            .await
    }

    /// Record progress: the new status and current operation code.
    pub async fn set_progress(
        conn: &mut PgConnection,
        id: DbId,
        status: OrderStatus,
        current_operation: &str,
    ) -> Result<ProductionOrder, sqlx::Error> {
        let query = format!(
            "UPDATE production_orders SET status = $2, current_operation = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProductionOrder>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(current_operation)
            .fetch_one(&mut *conn)
            .await
    }
}
