//! Operation model.

use pchart_core::operation::OperationState;
use pchart_core::types::{DbId, Quantity, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `operations` table.
///
/// `output_quantity` and `end_time` are set together, on completion.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Operation {
    pub id: DbId,
    pub production_order_id: DbId,
    pub operation_code: String,
    pub sequence_index: i32,
    pub input_quantity: Option<Quantity>,
    pub output_quantity: Option<Quantity>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub line_no: Option<String>,
    pub resource_factor: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Operation {
    pub fn state(&self) -> OperationState {
        OperationState::from_times(self.start_time, self.end_time)
    }

    /// Replacement quantities only count on the first operation.
    pub fn is_first(&self) -> bool {
        self.sequence_index == 0
    }
}
