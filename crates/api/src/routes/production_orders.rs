//! Route definitions for the `/production-orders` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::production_orders;
use crate::state::AppState;

/// Routes mounted at `/production-orders`.
///
/// ```text
/// GET    /                     -> list
/// POST   /                     -> create (admin)
/// GET    /{order_number}       -> get_detail
/// PUT    /{order_number}       -> update (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(production_orders::list).post(production_orders::create),
        )
        .route(
            "/{order_number}",
            get(production_orders::get_detail).put(production_orders::update),
        )
}
