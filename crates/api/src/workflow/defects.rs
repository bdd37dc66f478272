//! Direct writes to an operation's defect ledger.
//!
//! Running operations are edited freely. Completed operations accept direct
//! writes from admins only; the stored output quantity is not recomputed.

use pchart_core::error::CoreError;
use pchart_core::operation::check_ledger_writable;
use pchart_core::roles::ActorContext;
use pchart_core::types::DbId;
use pchart_db::models::defect::{DefectInput, OperationDefect};
use pchart_db::models::operation::Operation;
use pchart_db::repositories::{OperationDefectRepo, OperationRepo, ProductionOrderRepo};
use pchart_db::DbPool;
use serde::Deserialize;

use super::{
    ensure_master_defects_exist, position_of, ENTITY_OPERATION, ENTITY_OPERATION_DEFECT,
    ENTITY_ORDER,
};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct RecordDefectRequest {
    pub po_number: String,
    pub operation_code: String,
    pub defect: DefectInput,
}

fn check_writable(actor: &ActorContext, operation: &Operation) -> AppResult<()> {
    check_ledger_writable(
        &operation.operation_code,
        operation.state(),
        actor.is_privileged(),
    )?;
    Ok(())
}

/// Create or overwrite the ledger entry for `(operation, defect_id)`.
///
/// The order and its operations stay row-locked from the writability check
/// until the write commits.
pub async fn record(
    pool: &DbPool,
    actor: &ActorContext,
    input: RecordDefectRequest,
) -> AppResult<OperationDefect> {
    actor.require_editor("record defects")?;
    ensure_master_defects_exist(pool, &[input.defect.defect_id]).await?;

    let mut tx = pool.begin().await?;
    let order = ProductionOrderRepo::find_by_number_for_update(&mut tx, &input.po_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, input.po_number.as_str()))?;
    let operations = OperationRepo::list_for_order_for_update(&mut tx, order.id).await?;
    let idx = position_of(&operations, &input.po_number, &input.operation_code)?;
    let operation = &operations[idx];
    check_writable(actor, operation)?;

    let quantities = input.defect.validate(operation.is_first())?;
    let entry =
        OperationDefectRepo::upsert(&mut *tx, operation.id, input.defect.defect_id, &quantities)
            .await?;
    tx.commit().await?;

    tracing::info!(
        po_number = %input.po_number,
        operation_code = %input.operation_code,
        defect_id = entry.defect_id,
        quantity_nogood = entry.quantity_nogood,
        user_id = actor.user_id,
        "Defect recorded"
    );
    Ok(entry)
}

/// Remove one ledger entry, under the same locks as [`record`].
pub async fn remove(pool: &DbPool, actor: &ActorContext, operation_defect_id: DbId) -> AppResult<()> {
    actor.require_editor("remove defects")?;

    let not_found = || CoreError::NotFound {
        entity: ENTITY_OPERATION_DEFECT,
        id: operation_defect_id,
    };
    let entry = OperationDefectRepo::find_by_id(pool, operation_defect_id)
        .await?
        .ok_or_else(not_found)?;
    let owner = OperationRepo::find_by_id(pool, entry.operation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: ENTITY_OPERATION,
            id: entry.operation_id,
        })?;

    let mut tx = pool.begin().await?;
    ProductionOrderRepo::find_by_id_for_update(&mut tx, owner.production_order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: ENTITY_ORDER,
            id: owner.production_order_id,
        })?;
    let operations =
        OperationRepo::list_for_order_for_update(&mut tx, owner.production_order_id).await?;
    let operation = operations
        .iter()
        .find(|op| op.id == entry.operation_id)
        .ok_or(CoreError::NotFound {
            entity: ENTITY_OPERATION,
            id: entry.operation_id,
        })?;
    check_writable(actor, operation)?;

    if !OperationDefectRepo::delete(&mut *tx, operation_defect_id).await? {
        return Err(not_found().into());
    }
    tx.commit().await?;

    tracing::info!(
        operation_defect_id,
        operation_id = operation.id,
        user_id = actor.user_id,
        "Defect removed"
    );
    Ok(())
}
