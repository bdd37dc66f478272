//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": message, "code": CODE}`. A 423
//! additionally carries the current holder under `"lock"`. Internal details
//! are logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pchart_core::error::CoreError;
use pchart_core::lock::LockInfo;
use serde::Serialize;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request that never reached the domain layer.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock: Option<&'a LockInfo>,
}

struct Classified<'a> {
    status: StatusCode,
    code: &'static str,
    message: String,
    lock: Option<&'a LockInfo>,
}

impl<'a> Classified<'a> {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            lock: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            INTERNAL_MESSAGE,
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => {
                Classified::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Classified::internal()
            }
        };

        let body = ErrorBody {
            error: classified.message,
            code: classified.code,
            lock: classified.lock,
        };
        (classified.status, Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> Classified<'_> {
    match err {
        CoreError::NotFound { entity, id } => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::NotFoundByKey { entity, key } => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{key}' not found"),
        ),
        CoreError::Validation(msg) => {
            Classified::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::InvalidTransition(msg) => {
            Classified::new(StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone())
        }
        CoreError::Locked(info) => Classified {
            status: StatusCode::LOCKED,
            code: "LOCKED",
            message: format!(
                "Production order is being edited by {} since {}",
                info.user_name, info.locked_at
            ),
            lock: Some(info.as_ref()),
        },
        CoreError::Conflict(msg) => Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => {
            Classified::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            Classified::internal()
        }
    }
}

/// `RowNotFound` is a 404 and a unique violation on a `uq_*` constraint is a
/// 409. Anything else is logged and reported as a 500.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified<'static> {
    if let sqlx::Error::RowNotFound = err {
        return Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found");
    }
    if let sqlx::Error::Database(db_err) = err {
        // 23505: unique_violation
        let constraint = db_err.constraint().unwrap_or_default();
        if db_err.code().as_deref() == Some("23505") && constraint.starts_with("uq_") {
            return Classified::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            );
        }
    }
    tracing::error!(error = %err, "Database error");
    Classified::internal()
}
