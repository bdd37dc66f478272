//! Role gates layered on [`AuthUser`]. Both reject with 403.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Admin only: force-release, resolving edit requests, catalog and user
/// management.
pub struct RequireAdmin(pub AuthUser);

/// Any role that may write (`admin` or `user`). Viewers are refused.
pub struct RequireEditor(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.actor().require_privileged("use this endpoint")?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireEditor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.actor().require_editor("make changes")?;
        Ok(Self(user))
    }
}
