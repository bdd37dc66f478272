//! Workflow services behind the HTTP handlers.
//!
//! Each service takes an explicit [`ActorContext`](pchart_core::roles::ActorContext)
//! and returns [`AppResult`](crate::error::AppResult). Multi-row state changes
//! run inside a single transaction.

pub mod defects;
pub mod edit_requests;
pub mod locks;
pub mod operations;

use pchart_core::error::CoreError;
use pchart_core::types::DbId;
use pchart_db::models::operation::Operation;
use pchart_db::models::production_order::ProductionOrder;
use pchart_db::repositories::{MasterDefectRepo, ProductionOrderRepo};
use pchart_db::DbPool;

use crate::error::AppResult;

pub(crate) const ENTITY_ORDER: &str = "ProductionOrder";
pub(crate) const ENTITY_OPERATION: &str = "Operation";
pub(crate) const ENTITY_MASTER_DEFECT: &str = "MasterDefect";
pub(crate) const ENTITY_OPERATION_DEFECT: &str = "OperationDefect";
pub(crate) const ENTITY_EDIT_REQUEST: &str = "DefectEditRequest";

/// Load a production order by number or fail with NotFound.
pub(crate) async fn load_order(pool: &DbPool, order_number: &str) -> AppResult<ProductionOrder> {
    ProductionOrderRepo::find_by_number(pool, order_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, order_number).into())
}

/// Position of `operation_code` within an order's operation list.
pub(crate) fn position_of(
    operations: &[Operation],
    order_number: &str,
    operation_code: &str,
) -> AppResult<usize> {
    operations
        .iter()
        .position(|op| op.operation_code == operation_code)
        .ok_or_else(|| {
            CoreError::not_found_key(ENTITY_OPERATION, format!("{order_number}/{operation_code}"))
                .into()
        })
}

/// Every id must name a master defect. Inactive defects are still accepted.
pub(crate) async fn ensure_master_defects_exist(pool: &DbPool, ids: &[DbId]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = MasterDefectRepo::existing_ids(pool, ids).await?;
    match ids.iter().find(|id| !found.contains(id)) {
        Some(&missing) => Err(CoreError::NotFound {
            entity: ENTITY_MASTER_DEFECT,
            id: missing,
        }
        .into()),
        None => Ok(()),
    }
}
