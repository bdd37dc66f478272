//! Handlers for defect edit requests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::types::DbId;
use pchart_db::models::edit_request::{CreateEditRequest, ResolveEditRequest};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireEditor};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::edit_requests::{self, ListEditRequestsParams};

/// POST /api/v1/edit-requests
pub async fn create(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CreateEditRequest>,
) -> AppResult<impl IntoResponse> {
    let request =
        edit_requests::create(&state.pool, &state.event_bus, &user.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(request))))
}

/// GET /api/v1/edit-requests?status=&sort_field=&sort_direction=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListEditRequestsParams>,
) -> AppResult<impl IntoResponse> {
    let requests = edit_requests::list(&state.pool, &auth.actor(), &params).await?;
    Ok(Json(DataResponse::new(requests)))
}

/// GET /api/v1/edit-requests/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = edit_requests::get(&state.pool, &auth.actor(), id).await?;
    Ok(Json(DataResponse::new(request)))
}

/// POST /api/v1/edit-requests/{id}/resolve
pub async fn resolve(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveEditRequest>,
) -> AppResult<impl IntoResponse> {
    let request =
        edit_requests::resolve(&state.pool, &state.event_bus, &admin.actor(), id, input).await?;
    Ok(Json(DataResponse::new(request)))
}
