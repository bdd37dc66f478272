//! Production order status and input validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Quantity;

/// Overall order status. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "inProgress",
            OrderStatus::Completed => "completed",
        }
    }

    /// Move towards `target`, never backwards.
    pub fn advance_to(self, target: OrderStatus) -> OrderStatus {
        self.max(target)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "inProgress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(CoreError::Validation(format!(
                "Invalid order status '{other}'. Must be one of: pending, inProgress, completed"
            ))),
        }
    }
}

pub fn validate_order_number(order_number: &str) -> Result<String, CoreError> {
    let trimmed = order_number.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "order_number must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_order_quantity(quantity: Quantity) -> Result<(), CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(format!(
            "Ordered quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

/// The ordered quantity feeds the first operation, so it is frozen once
/// the order has left `pending`.
pub fn check_quantity_editable(status: OrderStatus) -> Result<(), CoreError> {
    if status != OrderStatus::Pending {
        return Err(CoreError::InvalidTransition(format!(
            "Ordered quantity cannot change once the order is {status}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn status_only_moves_forward() {
        assert_eq!(
            OrderStatus::Pending.advance_to(OrderStatus::InProgress),
            OrderStatus::InProgress
        );
        assert_eq!(
            OrderStatus::Completed.advance_to(OrderStatus::InProgress),
            OrderStatus::Completed
        );
        assert_eq!(
            OrderStatus::InProgress.advance_to(OrderStatus::Pending),
            OrderStatus::InProgress
        );
    }

    #[test]
    fn status_strings_round_trip_through_db_values() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::InProgress,
            OrderStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("in_progress".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn serde_uses_camel_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            r#""inProgress""#
        );
    }

    #[test]
    fn order_number_validation() {
        assert_eq!(validate_order_number(" PO-100 ").unwrap(), "PO-100");
        assert!(validate_order_number("").is_err());
    }

    #[test]
    fn quantity_validation() {
        assert!(validate_order_quantity(1).is_ok());
        assert!(validate_order_quantity(0).is_err());
        assert!(validate_order_quantity(-5).is_err());
    }

    #[test]
    fn quantity_frozen_after_start() {
        assert!(check_quantity_editable(OrderStatus::Pending).is_ok());
        assert_matches!(
            check_quantity_editable(OrderStatus::InProgress),
            Err(CoreError::InvalidTransition(_))
        );
    }
}
