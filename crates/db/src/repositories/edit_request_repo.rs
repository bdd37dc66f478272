//! Repository for the `defect_edit_requests` table.

use pchart_core::edit_request::{RequestStatus, SortSpec, StatusFilter};
use pchart_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::edit_request::{DefectEditRequest, NewEditRequest};

/// Column list for `defect_edit_requests` queries.
const COLUMNS: &str = "id, operation_defect_id, operation_id, production_order_id, defect_id, \
                       requester_id, request_type, \
                       current_quantity, current_quantity_rework, current_quantity_nogood, \
                       current_quantity_replacement, \
                       requested_quantity, requested_quantity_rework, requested_quantity_nogood, \
                       requested_quantity_replacement, \
                       reason, status, resolver_id, resolution_note, resolved_at, \
                       created_at, updated_at";

/// Provides CRUD operations for defect edit requests.
pub struct EditRequestRepo;

impl EditRequestRepo {
    /// Insert a new pending request, returning the created row.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &NewEditRequest,
    ) -> Result<DefectEditRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO defect_edit_requests \
                (operation_defect_id, operation_id, production_order_id, defect_id, \
                 requester_id, request_type, \
                 current_quantity, current_quantity_rework, current_quantity_nogood, \
                 current_quantity_replacement, \
                 requested_quantity, requested_quantity_rework, requested_quantity_nogood, \
                 requested_quantity_replacement, reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DefectEditRequest>(&query)
            .bind(input.operation_defect_id)
            .bind(input.operation_id)
            .bind(input.production_order_id)
            .bind(input.defect_id)
            .bind(input.requester_id)
            .bind(input.request_type.as_str())
            .bind(input.current.quantity)
            .bind(input.current.quantity_rework)
            .bind(input.current.quantity_nogood)
            .bind(input.current.quantity_replacement)
            .bind(input.requested.quantity)
            .bind(input.requested.quantity_rework)
            .bind(input.requested.quantity_nogood)
            .bind(input.requested.quantity_replacement)
            .bind(&input.reason)
            .fetch_one(executor)
            .await
    }

    /// Find a request by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<DefectEditRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM defect_edit_requests WHERE id = $1");
        sqlx::query_as::<_, DefectEditRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List requests.
    ///
    /// `requester_id` restricts the list to one user's own requests. The
    /// sort column comes from a whitelist and is interpolated directly.
    pub async fn list(
        pool: &PgPool,
        status: StatusFilter,
        sort: &SortSpec,
        requester_id: Option<DbId>,
    ) -> Result<Vec<DefectEditRequest>, sqlx::Error> {
        let status = match status {
            StatusFilter::Only(s) => Some(s.as_str()),
            StatusFilter::All => None,
        };
        let query = format!(
            "SELECT {COLUMNS} FROM defect_edit_requests \
             WHERE ($1::TEXT IS NULL OR status = $1) \
               AND ($2::BIGINT IS NULL OR requester_id = $2) \
             ORDER BY {field} {direction}, id {direction}",
            field = sort.field,
            direction = sort.direction.as_sql(),
        );
        sqlx::query_as::<_, DefectEditRequest>(&query)
            .bind(status)
            .bind(requester_id)
            .fetch_all(pool)
            .await
    }

    /// Move a pending request to a terminal status.
    ///
    /// The `status = 'pending'` guard means only one resolver wins; the
    /// loser gets `None` and the row is left untouched.
    pub async fn resolve_pending(
        conn: &mut PgConnection,
        id: DbId,
        status: RequestStatus,
        resolver_id: DbId,
        resolution_note: Option<&str>,
    ) -> Result<Option<DefectEditRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE defect_edit_requests \
             SET status = $2, resolver_id = $3, resolution_note = $4, resolved_at = NOW() \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DefectEditRequest>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(resolver_id)
            .bind(resolution_note)
            .fetch_optional(&mut *conn)
            .await
    }
}
