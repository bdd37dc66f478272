#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pchart_api::auth::jwt::{generate_access_token, JwtConfig};
use pchart_api::config::ServerConfig;
use pchart_api::router::build_app_router;
use pchart_api::state::AppState;
use pchart_core::operation::DEFAULT_OPERATION_STEPS;
use pchart_db::repositories::UserRepo;
use pchart_events::EventBus;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        operation_steps: DEFAULT_OPERATION_STEPS.iter().map(|s| s.to_string()).collect(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

/// Same as [`build_test_app`] but with a caller-owned bus so tests can
/// observe published events.
pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus,
    };
    build_app_router(state, &config)
}

/// A user row plus a bearer token for it.
pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub token: String,
}

/// Insert a user with `role` and issue an access token for it.
pub async fn create_user(pool: &PgPool, username: &str, role: &str) -> TestUser {
    let display_name = format!("{username} (test)");
    let user = UserRepo::create(pool, username, &display_name, role)
        .await
        .expect("user insert should succeed");
    let token = generate_access_token(user.id, &user.display_name, &user.role, &test_config().jwt)
        .expect("token generation should succeed");
    TestUser {
        id: user.id,
        name: user.display_name,
        token,
    }
}

/// Seed the master defect catalog with one entry and return its id.
pub async fn create_master_defect(pool: &PgPool, name: &str) -> i64 {
    pchart_db::repositories::MasterDefectRepo::create(pool, name, "surface", false, None)
        .await
        .expect("master defect insert should succeed")
        .id
}

/// Create a production order through the API as `admin`.
pub async fn create_order(pool: &PgPool, admin: &TestUser, order_number: &str, quantity: i32) {
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/production-orders",
        serde_json::json!({
            "order_number": order_number,
            "lot_number": "LOT-1",
            "item_name": "Bracket",
            "quantity": quantity,
        }),
        &admin.token,
    )
    .await;
    expect_status(response, StatusCode::CREATED).await;
}

/// `POST /operations/start` for `operation_code` on `order_number`.
pub async fn start_operation(
    pool: &PgPool,
    user: &TestUser,
    order_number: &str,
    operation_code: &str,
) -> Response {
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/operations/start",
        serde_json::json!({"po_number": order_number, "operation_code": operation_code}),
        &user.token,
    )
    .await
}

/// `POST /operations/complete` with a defect snapshot.
pub async fn complete_operation(
    pool: &PgPool,
    user: &TestUser,
    order_number: &str,
    operation_code: &str,
    defects: serde_json::Value,
) -> Response {
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/operations/complete",
        serde_json::json!({
            "po_number": order_number,
            "operation_code": operation_code,
            "line_no": "L1",
            "defects": defects,
        }),
        &user.token,
    )
    .await
}

/// Read the full response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the response status and return the JSON body (`Null` for an
/// empty body).
pub async fn expect_status(response: Response, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
