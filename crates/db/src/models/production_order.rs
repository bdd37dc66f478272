//! Production order model and DTOs.

use pchart_core::error::CoreError;
use pchart_core::lock::LockInfo;
use pchart_core::production_order::OrderStatus;
use pchart_core::types::{DbId, Quantity, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `production_orders` table.
///
/// The advisory edit lock lives in `editing_user_id`, `editing_user_name`
/// and `locked_at`; all three null means unlocked.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductionOrder {
    pub id: DbId,
    pub order_number: String,
    pub lot_number: String,
    pub item_name: String,
    pub quantity: Quantity,
    pub status: String,
    pub current_operation: String,
    pub editing_user_id: Option<DbId>,
    pub editing_user_name: Option<String>,
    pub locked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProductionOrder {
    pub fn order_status(&self) -> Result<OrderStatus, CoreError> {
        self.status.parse()
    }

    pub fn lock_info(&self) -> Result<Option<LockInfo>, CoreError> {
        LockInfo::from_columns(
            self.editing_user_id,
            self.editing_user_name.as_deref(),
            self.locked_at,
        )
    }
}

/// DTO for creating a production order.
#[derive(Debug, Deserialize)]
pub struct CreateProductionOrder {
    pub order_number: String,
    pub lot_number: Option<String>,
    pub quantity: Quantity,
    pub item_name: Option<String>,
}

/// DTO for updating a production order. The order number never changes.
#[derive(Debug, Deserialize)]
pub struct UpdateProductionOrder {
    pub lot_number: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<Quantity>,
}
