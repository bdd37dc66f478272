//! Operation start and completion.
//!
//! Completion is atomic: the defect snapshot, the computed output, the end
//! time and the order's progress are written in one transaction. Starting the
//! next operation happens afterwards in its own transaction and only adds a
//! warning when it fails.

use chrono::Utc;
use pchart_core::cascade::compute_output;
use pchart_core::defect::{validate_unique_defect_ids, DefectQuantities};
use pchart_core::error::CoreError;
use pchart_core::operation::{
    check_can_complete, check_can_start, start_input_quantity, validate_end_time,
    validate_line_no, validate_resource_factor, StartAction, DEFAULT_RESOURCE_FACTOR,
};
use pchart_core::production_order::OrderStatus;
use pchart_core::roles::ActorContext;
use pchart_core::types::{DbId, Timestamp};
use pchart_db::models::defect::{DefectInput, OperationDefect};
use pchart_db::models::operation::Operation;
use pchart_db::models::production_order::ProductionOrder;
use pchart_db::repositories::{OperationDefectRepo, OperationRepo, ProductionOrderRepo};
use pchart_db::DbPool;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::{ensure_master_defects_exist, position_of, ENTITY_ORDER};
use crate::error::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartOperationRequest {
    pub po_number: String,
    pub operation_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteOperationRequest {
    pub po_number: String,
    pub operation_code: String,
    /// Resource factor; defaults to 1.
    pub rf: Option<f64>,
    /// Full ledger snapshot, zero-quantity entries included.
    #[serde(default)]
    pub defects: Vec<DefectInput>,
    pub line_no: String,
    /// Completion time; defaults to now.
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct StartOutcome {
    pub operation: Operation,
    pub order: ProductionOrder,
    /// The operation was already running and nothing changed.
    pub already_started: bool,
}

#[derive(Debug, Serialize)]
pub struct CompleteOutcome {
    pub operation: Operation,
    pub defects: Vec<OperationDefect>,
    /// The next operation, when it was started automatically.
    pub next_operation: Option<Operation>,
    pub order: ProductionOrder,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// Start `operation_code` on `po_number`.
///
/// Starting an operation that is already running is a no-op.
pub async fn start(
    pool: &DbPool,
    actor: &ActorContext,
    po_number: &str,
    operation_code: &str,
) -> AppResult<StartOutcome> {
    actor.require_editor("start operations")?;

    let mut tx = pool.begin().await?;
    let outcome = start_in_tx(&mut tx, po_number, operation_code).await?;
    tx.commit().await?;

    if !outcome.already_started {
        tracing::info!(
            po_number,
            operation_code,
            user_id = actor.user_id,
            input_quantity = outcome.operation.input_quantity,
            "Operation started"
        );
    }
    Ok(outcome)
}

async fn start_in_tx(
    conn: &mut PgConnection,
    po_number: &str,
    operation_code: &str,
) -> AppResult<StartOutcome> {
    let order = ProductionOrderRepo::find_by_number_for_update(&mut *conn, po_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, po_number))?;
    let operations = OperationRepo::list_for_order_for_update(&mut *conn, order.id).await?;
    let idx = position_of(&operations, po_number, operation_code)?;
    let operation = &operations[idx];
    let predecessor = idx.checked_sub(1).map(|i| &operations[i]);

    let action = check_can_start(
        &order.current_operation,
        operation_code,
        operation.state(),
        predecessor.map(Operation::state),
    )?;

    if action == StartAction::AlreadyStarted {
        return Ok(StartOutcome {
            operation: operation.clone(),
            order,
            already_started: true,
        });
    }

    let input = start_input_quantity(order.quantity, predecessor.and_then(|p| p.output_quantity));
    let started = OperationRepo::mark_started(&mut *conn, operation.id, input)
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(format!("Operation {operation_code} was started concurrently"))
        })?;

    let status = order.order_status()?.advance_to(OrderStatus::InProgress);
    let order =
        ProductionOrderRepo::set_progress(&mut *conn, order.id, status, &order.current_operation)
            .await?;

    Ok(StartOutcome {
        operation: started,
        order,
        already_started: false,
    })
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Complete an operation with its defect snapshot and start the next one.
pub async fn complete(
    pool: &DbPool,
    actor: &ActorContext,
    input: CompleteOperationRequest,
) -> AppResult<CompleteOutcome> {
    actor.require_editor("complete operations")?;

    let line_no = validate_line_no(&input.line_no)?;
    let rf = input.rf.unwrap_or(DEFAULT_RESOURCE_FACTOR);
    validate_resource_factor(rf)?;
    let defect_ids: Vec<DbId> = input.defects.iter().map(|d| d.defect_id).collect();
    validate_unique_defect_ids(&defect_ids)?;
    ensure_master_defects_exist(pool, &defect_ids).await?;

    let po_number = input.po_number.as_str();
    let operation_code = input.operation_code.as_str();

    let mut tx = pool.begin().await?;

    let order = ProductionOrderRepo::find_by_number_for_update(&mut tx, po_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, po_number))?;
    let operations = OperationRepo::list_for_order_for_update(&mut tx, order.id).await?;
    let idx = position_of(&operations, po_number, operation_code)?;
    let operation = &operations[idx];

    check_can_complete(operation_code, operation.state())?;
    let (start_time, input_quantity) = match (operation.start_time, operation.input_quantity) {
        (Some(start), Some(qty)) => (start, qty),
        _ => {
            return Err(AppError::InternalError(format!(
                "Started operation {} has no start time or input quantity",
                operation.id
            )))
        }
    };
    let end_time = match input.timestamp {
        Some(ts) => {
            validate_end_time(start_time, ts)?;
            ts
        }
        None => Utc::now().max(start_time),
    };

    let is_first = operation.is_first();
    let snapshot = input
        .defects
        .iter()
        .map(|d| d.validate(is_first).map(|q| (d.defect_id, q)))
        .collect::<Result<Vec<(DbId, DefectQuantities)>, CoreError>>()?;
    for (defect_id, quantities) in &snapshot {
        OperationDefectRepo::upsert(&mut *tx, operation.id, *defect_id, quantities).await?;
    }

    let ledger = OperationDefectRepo::list_for_operation(&mut *tx, operation.id).await?;
    let quantities: Vec<DefectQuantities> = ledger.iter().map(OperationDefect::quantities).collect();
    let output = compute_output(input_quantity, &quantities, is_first)?;

    let completed =
        OperationRepo::mark_completed(&mut tx, operation.id, output, end_time, &line_no, rf)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Operation {operation_code} was completed concurrently"
                ))
            })?;

    let next_code = operations.get(idx + 1).map(|op| op.operation_code.clone());
    let (status, current_operation) = match &next_code {
        Some(code) => (
            order.order_status()?.advance_to(OrderStatus::InProgress),
            code.as_str(),
        ),
        None => (OrderStatus::Completed, operation_code),
    };
    let mut order =
        ProductionOrderRepo::set_progress(&mut tx, order.id, status, current_operation).await?;

    tx.commit().await?;

    tracing::info!(
        po_number,
        operation_code,
        user_id = actor.user_id,
        input_quantity,
        output_quantity = output,
        defects = ledger.len(),
        "Operation completed"
    );

    let mut warnings = Vec::new();
    let mut next_operation = None;
    if let Some(code) = next_code {
        match auto_start(pool, po_number, &code).await {
            Ok(outcome) => {
                order = outcome.order;
                next_operation = Some(outcome.operation);
            }
            Err(e) => {
                tracing::warn!(
                    po_number,
                    operation_code = %code,
                    error = %e,
                    "Automatic start of the next operation failed"
                );
                warnings.push(format!(
                    "Operation {code} was not started automatically: {e}"
                ));
            }
        }
    }

    Ok(CompleteOutcome {
        operation: completed,
        defects: ledger,
        next_operation,
        order,
        warnings,
    })
}

async fn auto_start(pool: &DbPool, po_number: &str, operation_code: &str) -> AppResult<StartOutcome> {
    let mut tx = pool.begin().await?;
    let outcome = start_in_tx(&mut tx, po_number, operation_code).await?;
    tx.commit().await?;
    Ok(outcome)
}
