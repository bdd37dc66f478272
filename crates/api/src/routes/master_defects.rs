use axum::routing::get;
use axum::Router;

use crate::handlers::master_defects;
use crate::state::AppState;

/// Routes mounted at `/master-defects`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create (admin)
/// GET    /{id}      -> get_by_id
/// PUT    /{id}      -> update (admin)
/// DELETE /{id}      -> deactivate (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(master_defects::list).post(master_defects::create))
        .route(
            "/{id}",
            get(master_defects::get_by_id)
                .put(master_defects::update)
                .delete(master_defects::deactivate),
        )
}
