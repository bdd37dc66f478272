//! Defect edit request model and DTOs.

use pchart_core::defect::DefectQuantities;
use pchart_core::edit_request::{RequestStatus, RequestType};
use pchart_core::error::CoreError;
use pchart_core::types::{DbId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `defect_edit_requests` table.
///
/// `current_*` columns snapshot the ledger entry when the request was made
/// (zeros for `add`); `requested_*` columns hold the proposed values.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DefectEditRequest {
    pub id: DbId,
    pub operation_defect_id: Option<DbId>,
    pub operation_id: DbId,
    pub production_order_id: DbId,
    pub defect_id: DbId,
    pub requester_id: DbId,
    pub request_type: String,
    pub current_quantity: Quantity,
    pub current_quantity_rework: Quantity,
    pub current_quantity_nogood: Quantity,
    pub current_quantity_replacement: Option<Quantity>,
    pub requested_quantity: Quantity,
    pub requested_quantity_rework: Quantity,
    pub requested_quantity_nogood: Quantity,
    pub requested_quantity_replacement: Option<Quantity>,
    pub reason: String,
    pub status: String,
    pub resolver_id: Option<DbId>,
    pub resolution_note: Option<String>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DefectEditRequest {
    pub fn request_type(&self) -> Result<RequestType, CoreError> {
        self.request_type.parse()
    }

    pub fn request_status(&self) -> Result<RequestStatus, CoreError> {
        self.status.parse()
    }

    pub fn requested(&self) -> DefectQuantities {
        DefectQuantities {
            quantity: self.requested_quantity,
            quantity_rework: self.requested_quantity_rework,
            quantity_nogood: self.requested_quantity_nogood,
            quantity_replacement: self.requested_quantity_replacement,
        }
    }
}

/// Insert payload built by the workflow layer after validation.
#[derive(Debug, Clone)]
pub struct NewEditRequest {
    pub operation_defect_id: Option<DbId>,
    pub operation_id: DbId,
    pub production_order_id: DbId,
    pub defect_id: DbId,
    pub requester_id: DbId,
    pub request_type: RequestType,
    pub current: DefectQuantities,
    pub requested: DefectQuantities,
    pub reason: String,
}

/// Client payload for `POST /edit-requests`.
#[derive(Debug, Deserialize)]
pub struct CreateEditRequest {
    /// Target ledger entry for `edit` / `delete`.
    pub operation_defect_id: Option<DbId>,
    /// Owning operation, required for `add`.
    pub operation_id: Option<DbId>,
    /// Master defect to add, required for `add`.
    pub defect_id: Option<DbId>,
    #[serde(default)]
    pub request_type: RequestType,
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub quantity_rework: Quantity,
    #[serde(default)]
    pub quantity_nogood: Quantity,
    pub quantity_replacement: Option<Quantity>,
    pub reason: String,
}

/// Client payload for `POST /edit-requests/{id}/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveEditRequest {
    pub status: String,
    pub comments: Option<String>,
}
