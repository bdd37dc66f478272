//! Handlers for the `/production-orders` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use pchart_core::error::CoreError;
use pchart_core::lock::LockStatus;
use pchart_core::production_order::{
    check_quantity_editable, validate_order_number, validate_order_quantity, OrderStatus,
};
use pchart_db::models::defect::OperationDefect;
use pchart_db::models::operation::Operation;
use pchart_db::models::production_order::{
    CreateProductionOrder, ProductionOrder, UpdateProductionOrder,
};
use pchart_db::repositories::{OperationDefectRepo, OperationRepo, ProductionOrderRepo};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::workflow::{load_order, locks, ENTITY_ORDER};

/// Query parameters for `GET /production-orders`.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    /// `pending`, `inProgress` or `completed`.
    pub status: Option<String>,
}

/// An order with everything the P-Chart screen shows.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: ProductionOrder,
    pub operations: Vec<Operation>,
    pub defects: Vec<OperationDefect>,
    pub lock: LockStatus,
}

/// POST /api/v1/production-orders
///
/// Seeds one operation per configured step.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProductionOrder>,
) -> AppResult<impl IntoResponse> {
    let order_number = validate_order_number(&input.order_number)?;
    validate_order_quantity(input.quantity)?;

    let order = ProductionOrderRepo::create_with_operations(
        &state.pool,
        &order_number,
        input.lot_number.as_deref().map(str::trim).unwrap_or_default(),
        input.item_name.as_deref().map(str::trim).unwrap_or_default(),
        input.quantity,
        &state.config.operation_steps,
    )
    .await?;

    tracing::info!(
        order_number = %order.order_number,
        quantity = order.quantity,
        admin_id = admin.user_id,
        "Production order created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(order))))
}

/// GET /api/v1/production-orders
pub async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> AppResult<impl IntoResponse> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let orders = ProductionOrderRepo::list(&state.pool, status).await?;
    Ok(Json(DataResponse::new(orders)))
}

/// GET /api/v1/production-orders/{order_number}
pub async fn get_detail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<impl IntoResponse> {
    let order = load_order(&state.pool, &order_number).await?;
    let operations = OperationRepo::list_for_order(&state.pool, order.id).await?;
    let defects = OperationDefectRepo::list_for_order(&state.pool, order.id).await?;
    let lock = locks::status(&state.pool, &auth.actor(), &order_number).await?;

    Ok(Json(DataResponse {
        data: OrderDetail {
            order,
            operations,
            defects,
            lock,
        },
    }))
}

/// PUT /api/v1/production-orders/{order_number}
///
/// The ordered quantity can only change while the order is pending.
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(input): Json<UpdateProductionOrder>,
) -> AppResult<impl IntoResponse> {
    // The row lock keeps a concurrent start of the first operation from
    // reading the old quantity.
    let mut tx = state.pool.begin().await?;
    let order = ProductionOrderRepo::find_by_number_for_update(&mut tx, &order_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, order_number.as_str()))?;
    if let Some(quantity) = input.quantity {
        validate_order_quantity(quantity)?;
        check_quantity_editable(order.order_status()?)?;
    }

    let updated = ProductionOrderRepo::update(
        &mut *tx,
        order.id,
        input.lot_number.as_deref().map(str::trim),
        input.item_name.as_deref().map(str::trim),
        input.quantity,
    )
    .await?
    .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, order_number.as_str()))?;
    tx.commit().await?;

    tracing::info!(
        order_number = %updated.order_number,
        admin_id = admin.user_id,
        "Production order updated"
    );
    Ok(Json(DataResponse::new(updated)))
}
