//! Repository for the `master_defects` catalog.

use pchart_core::types::DbId;
use sqlx::PgPool;

use crate::models::defect::MasterDefect;

/// Column list for `master_defects` queries.
const COLUMNS: &str =
    "id, name, category, is_reworkable, machine_name, is_active, created_at, updated_at";

/// Provides CRUD operations for master defects.
pub struct MasterDefectRepo;

impl MasterDefectRepo {
    /// Insert a new master defect, returning the created row.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        category: &str,
        is_reworkable: bool,
        machine_name: Option<&str>,
    ) -> Result<MasterDefect, sqlx::Error> {
        let query = format!(
            "INSERT INTO master_defects (name, category, is_reworkable, machine_name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MasterDefect>(&query)
            .bind(name)
            .bind(category)
            .bind(is_reworkable)
            .bind(machine_name)
            .fetch_one(pool)
            .await
    }

    /// Find a master defect by internal ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MasterDefect>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM master_defects WHERE id = $1");
        sqlx::query_as::<_, MasterDefect>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List master defects ordered by name.
    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
    ) -> Result<Vec<MasterDefect>, sqlx::Error> {
        let filter = if include_inactive {
            ""
        } else {
            "WHERE is_active = true"
        };
        let query = format!("SELECT {COLUMNS} FROM master_defects {filter} ORDER BY name ASC");
        sqlx::query_as::<_, MasterDefect>(&query)
            .fetch_all(pool)
            .await
    }

    /// Update a master defect. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: Option<&str>,
        category: Option<&str>,
        is_reworkable: Option<bool>,
        machine_name: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<MasterDefect>, sqlx::Error> {
        let query = format!(
            "UPDATE master_defects SET \
                name = COALESCE($2, name), \
                category = COALESCE($3, category), \
                is_reworkable = COALESCE($4, is_reworkable), \
                machine_name = COALESCE($5, machine_name), \
                is_active = COALESCE($6, is_active) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MasterDefect>(&query)
            .bind(id)
            .bind(name)
            .bind(category)
            .bind(is_reworkable)
            .bind(machine_name)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Deactivate a master defect. Ledger rows keep referencing it.
    ///
    /// Returns `true` if the row existed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE master_defects SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Which of `ids` exist in the catalog (active or not).
    pub async fn existing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM master_defects WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
