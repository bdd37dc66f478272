//! Handlers for direct defect ledger writes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::rbac::RequireEditor;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::defects::{self, RecordDefectRequest};

/// POST /api/v1/operation-defects
pub async fn record(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<RecordDefectRequest>,
) -> AppResult<impl IntoResponse> {
    let entry = defects::record(&state.pool, &user.actor(), input).await?;
    Ok(Json(DataResponse::new(entry)))
}

/// DELETE /api/v1/operation-defects/{id}
pub async fn remove(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    defects::remove(&state.pool, &user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
