//! Handlers for advisory production-order locks.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::lock::validate_resource_ref;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::locks;

/// Body of the acquire, release and force-release endpoints.
#[derive(Debug, Deserialize)]
pub struct LockRequest {
    /// Always `productionOrder`.
    pub resource_type: String,
    /// The order number.
    pub resource_id: String,
}

impl LockRequest {
    fn order_number(&self) -> AppResult<&str> {
        validate_resource_ref(&self.resource_type, &self.resource_id)
            .map_err(AppError::BadRequest)?;
        Ok(&self.resource_id)
    }
}

/// POST /api/v1/locks/acquire
///
/// Returns 423 with the holder's details when someone else holds the lock.
pub async fn acquire(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<LockRequest>,
) -> AppResult<impl IntoResponse> {
    let order_number = input.order_number()?;
    let result = locks::acquire(&state.pool, &state.event_bus, &auth.actor(), order_number).await?;
    Ok(Json(DataResponse::new(result)))
}

/// POST /api/v1/locks/release
pub async fn release(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<LockRequest>,
) -> AppResult<impl IntoResponse> {
    let order_number = input.order_number()?;
    let result = locks::release(&state.pool, &state.event_bus, &auth.actor(), order_number).await?;
    Ok(Json(DataResponse::new(result)))
}

/// POST /api/v1/locks/force-release
pub async fn force_release(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<LockRequest>,
) -> AppResult<impl IntoResponse> {
    let order_number = input.order_number()?;
    let result =
        locks::force_release(&state.pool, &state.event_bus, &admin.actor(), order_number).await?;
    Ok(Json(DataResponse::new(result)))
}

/// GET /api/v1/locks/{resource_type}/{resource_id}
pub async fn get_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    validate_resource_ref(&resource_type, &resource_id).map_err(AppError::BadRequest)?;
    let status = locks::status(&state.pool, &auth.actor(), &resource_id).await?;
    Ok(Json(DataResponse::new(status)))
}
