pub mod edit_requests;
pub mod health;
pub mod locks;
pub mod master_defects;
pub mod notifications;
pub mod operation_defects;
pub mod operations;
pub mod production_orders;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /locks/acquire                                   acquire (POST)
/// /locks/release                                   release (POST)
/// /locks/force-release                             force-release (POST, admin)
/// /locks/{resource_type}/{resource_id}             lock status (GET)
///
/// /production-orders                               list, create (admin)
/// /production-orders/{order_number}                detail, update (admin)
///
/// /operations/start                                start (POST)
/// /operations/complete                             complete (POST)
///
/// /operation-defects                               record (POST)
/// /operation-defects/{id}                          remove (DELETE)
///
/// /edit-requests                                   list, create
/// /edit-requests/{id}                              get
/// /edit-requests/{id}/resolve                      resolve (POST, admin)
///
/// /master-defects                                  list, create (admin)
/// /master-defects/{id}                             get, update, deactivate (admin)
///
/// /users                                           list, create (admin)
/// /users/me                                        current user
/// /users/{id}                                      delete (admin)
///
/// /notifications                                   list
/// /notifications/unread-count                      unread count
/// /notifications/read-all                          mark all read (POST)
/// /notifications/{id}/read                         mark read (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/locks", locks::router())
        .nest("/production-orders", production_orders::router())
        .nest("/operations", operations::router())
        .nest("/operation-defects", operation_defects::router())
        .nest("/edit-requests", edit_requests::router())
        .nest("/master-defects", master_defects::router())
        .nest("/users", users::router())
        .nest("/notifications", notifications::router())
}
