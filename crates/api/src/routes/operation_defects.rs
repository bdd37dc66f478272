use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::defects;
use crate::state::AppState;

/// Routes mounted at `/operation-defects`.
///
/// ```text
/// POST   /         -> record
/// DELETE /{id}     -> remove
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(defects::record))
        .route("/{id}", delete(defects::remove))
}
