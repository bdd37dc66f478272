//! Handlers for the `/notifications` resource.
//!
//! All endpoints act on the authenticated user's own notifications.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::error::CoreError;
use pchart_core::types::DbId;
use pchart_db::repositories::NotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::notifications::router::publish_unread_count;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UnreadFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

/// GET /api/v1/notifications?unread_only=&limit=&offset=
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<UnreadFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let notifications = NotificationRepo::list_for_user(
        &state.pool,
        auth.user_id,
        filter.unread_only,
        page.limit(),
        page.offset(),
    )
    .await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let unread_count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCount { unread_count },
    }))
}

/// POST /api/v1/notifications/{id}/read
///
/// 404 when the notification does not belong to the caller.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !NotificationRepo::mark_read(&state.pool, id, auth.user_id).await? {
        return Err(CoreError::NotFound {
            entity: "Notification",
            id,
        }
        .into());
    }
    announce_count(&state, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let updated = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;
    if updated > 0 {
        announce_count(&state, auth.user_id).await?;
    }
    Ok(Json(DataResponse {
        data: serde_json::json!({ "updated": updated }),
    }))
}

async fn announce_count(state: &AppState, user_id: DbId) -> AppResult<()> {
    let unread = NotificationRepo::unread_count(&state.pool, user_id).await?;
    publish_unread_count(&state.event_bus, user_id, unread);
    Ok(())
}
