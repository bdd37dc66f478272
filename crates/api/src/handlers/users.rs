//! Admin handlers for the `/users` resource.
//!
//! Users are the role provider for locks and edit requests. Deleting a user
//! is a hard delete; any lock they held stays in place and reads as orphaned.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::error::CoreError;
use pchart_core::roles::{validate_role, ROLE_USER};
use pchart_core::types::DbId;
use pchart_db::models::user::CreateUser;
use pchart_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;
    Ok(Json(DataResponse::new(user)))
}

/// GET /api/v1/users
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse::new(users)))
}

/// POST /api/v1/users
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let username = input.username.trim();
    let display_name = input.display_name.trim();
    if username.is_empty() || display_name.is_empty() {
        return Err(CoreError::Validation(
            "username and display_name must not be empty".to_string(),
        )
        .into());
    }
    let role = input.role.as_deref().unwrap_or(ROLE_USER);
    validate_role(role).map_err(CoreError::Validation)?;

    let user = UserRepo::create(&state.pool, username, display_name, role).await?;
    tracing::info!(user_id = user.id, role = %user.role, admin_id = admin.user_id, "User created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if id == admin.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: "User", id }.into());
    }
    tracing::info!(user_id = id, admin_id = admin.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
