//! Handlers for the master defect catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::defect::validate_defect_name;
use pchart_core::error::CoreError;
use pchart_core::types::DbId;
use pchart_db::models::defect::{CreateMasterDefect, UpdateMasterDefect};
use pchart_db::repositories::MasterDefectRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::ENTITY_MASTER_DEFECT;

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY_MASTER_DEFECT,
        id,
    }
}

/// GET /api/v1/master-defects?include_inactive=
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let defects = MasterDefectRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse::new(defects)))
}

/// GET /api/v1/master-defects/{id}
pub async fn get_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let defect = MasterDefectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse::new(defect)))
}

/// POST /api/v1/master-defects
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateMasterDefect>,
) -> AppResult<impl IntoResponse> {
    let name = validate_defect_name(&input.name)?;
    let defect = MasterDefectRepo::create(
        &state.pool,
        &name,
        input.category.as_deref().map(str::trim).unwrap_or_default(),
        input.is_reworkable.unwrap_or(false),
        input.machine_name.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(defect))))
}

/// PUT /api/v1/master-defects/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMasterDefect>,
) -> AppResult<impl IntoResponse> {
    let name = input.name.as_deref().map(validate_defect_name).transpose()?;
    let defect = MasterDefectRepo::update(
        &state.pool,
        id,
        name.as_deref(),
        input.category.as_deref(),
        input.is_reworkable,
        input.machine_name.as_deref(),
        input.is_active,
    )
    .await?
    .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse::new(defect)))
}

/// DELETE /api/v1/master-defects/{id}
///
/// Deactivates the entry; recorded defects keep referring to it.
pub async fn deactivate(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !MasterDefectRepo::deactivate(&state.pool, id).await? {
        return Err(not_found(id).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
