//! Route definitions for defect edit requests.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::edit_requests;
use crate::state::AppState;

/// Routes mounted at `/edit-requests`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// POST   /{id}/resolve     -> resolve (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(edit_requests::list).post(edit_requests::create))
        .route("/{id}", get(edit_requests::get_by_id))
        .route("/{id}/resolve", post(edit_requests::resolve))
}
