//! Handlers for starting and completing operations.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireEditor;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::operations::{self, CompleteOperationRequest, StartOperationRequest};

/// POST /api/v1/operations/start
pub async fn start(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<StartOperationRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = operations::start(
        &state.pool,
        &user.actor(),
        &input.po_number,
        &input.operation_code,
    )
    .await?;
    Ok(Json(DataResponse::new(outcome)))
}

/// POST /api/v1/operations/complete
///
/// A failed automatic start of the next operation is reported in
/// `warnings` and does not fail the completion.
pub async fn complete(
    RequireEditor(user): RequireEditor,
    State(state): State<AppState>,
    Json(input): Json<CompleteOperationRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = operations::complete(&state.pool, &user.actor(), input).await?;
    Ok(Json(DataResponse::new(outcome)))
}
