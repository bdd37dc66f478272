//! Master defect catalog and per-operation defect ledger models.

use pchart_core::defect::DefectQuantities;
use pchart_core::error::CoreError;
use pchart_core::types::{DbId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// MasterDefect
// ---------------------------------------------------------------------------

/// A row from the `master_defects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MasterDefect {
    pub id: DbId,
    pub name: String,
    pub category: String,
    pub is_reworkable: bool,
    pub machine_name: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateMasterDefect {
    pub name: String,
    pub category: Option<String>,
    pub is_reworkable: Option<bool>,
    pub machine_name: Option<String>,
}

/// DTO for updating a master defect. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateMasterDefect {
    pub name: Option<String>,
    pub category: Option<String>,
    pub is_reworkable: Option<bool>,
    pub machine_name: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// OperationDefect
// ---------------------------------------------------------------------------

/// A row from the `operation_defects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OperationDefect {
    pub id: DbId,
    pub operation_id: DbId,
    pub defect_id: DbId,
    pub quantity: Quantity,
    pub quantity_rework: Quantity,
    pub quantity_nogood: Quantity,
    pub quantity_replacement: Option<Quantity>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OperationDefect {
    pub fn quantities(&self) -> DefectQuantities {
        DefectQuantities {
            quantity: self.quantity,
            quantity_rework: self.quantity_rework,
            quantity_nogood: self.quantity_nogood,
            quantity_replacement: self.quantity_replacement,
        }
    }
}

/// One ledger entry as sent by clients, either alone or inside a completion
/// snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct DefectInput {
    pub defect_id: DbId,
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub quantity_rework: Quantity,
    #[serde(default)]
    pub quantity_nogood: Quantity,
    pub quantity_replacement: Option<Quantity>,
}

impl DefectInput {
    pub fn validate(&self, is_first_operation: bool) -> Result<DefectQuantities, CoreError> {
        DefectQuantities::new(
            self.quantity,
            self.quantity_rework,
            self.quantity_nogood,
            self.quantity_replacement,
            is_first_operation,
        )
    }
}
