//! Route definitions for advisory locks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::locks;
use crate::state::AppState;

/// Routes mounted at `/locks`.
///
/// ```text
/// POST   /acquire                            -> acquire
/// POST   /release                            -> release
/// POST   /force-release                      -> force_release (admin)
/// GET    /{resource_type}/{resource_id}      -> get_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/acquire", post(locks::acquire))
        .route("/release", post(locks::release))
        .route("/force-release", post(locks::force_release))
        .route("/{resource_type}/{resource_id}", get(locks::get_status))
}
