use axum::routing::post;
use axum::Router;

use crate::handlers::operations;
use crate::state::AppState;

/// Routes mounted at `/operations`.
///
/// ```text
/// POST   /start        -> start
/// POST   /complete     -> complete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(operations::start))
        .route("/complete", post(operations::complete))
}
