//! Caller identity from the `Authorization: Bearer <jwt>` header.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use pchart_core::error::CoreError;
use pchart_core::roles::{validate_role, ActorContext};
use pchart_core::types::DbId;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// The verified caller. Handlers hand [`AuthUser::actor`] to the workflow
/// services.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Display name; recorded as the lock holder's name.
    pub user_name: String,
    pub role: String,
}

impl AuthUser {
    pub fn actor(&self) -> ActorContext {
        ActorContext::new(self.user_id, self.user_name.clone(), self.role.clone())
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            user_name: claims.name,
            role: claims.role,
        }
    }
}

fn unauthorized(msg: impl Into<String>) -> AppError {
    CoreError::Unauthorized(msg.into()).into()
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Authorization header is not valid ASCII"))?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            unauthorized("Invalid or expired token")
        })?;
        // A token minted with a role this server does not know grants nothing.
        validate_role(&claims.role).map_err(unauthorized)?;
        Ok(claims.into())
    }
}
