//! Defect quantity rules for the per-operation defect ledger.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Quantity};

/// Validated quantities of one ledger entry.
///
/// `quantity == quantity_rework + quantity_nogood` always holds and every
/// field is non-negative. `quantity_replacement` is `Some` only for entries
/// on the first operation of the sequence and `None` everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectQuantities {
    pub quantity: Quantity,
    pub quantity_rework: Quantity,
    pub quantity_nogood: Quantity,
    pub quantity_replacement: Option<Quantity>,
}

impl DefectQuantities {
    /// Validate raw client input.
    ///
    /// `quantity` may be omitted, in which case it is derived from the rework
    /// and no-good split. A non-zero replacement on a later operation is
    /// rejected; a zero one is dropped.
    pub fn new(
        quantity: Option<Quantity>,
        quantity_rework: Quantity,
        quantity_nogood: Quantity,
        quantity_replacement: Option<Quantity>,
        is_first_operation: bool,
    ) -> Result<Self, CoreError> {
        check_non_negative("quantity_rework", quantity_rework)?;
        check_non_negative("quantity_nogood", quantity_nogood)?;

        let total = quantity_rework.checked_add(quantity_nogood).ok_or_else(|| {
            CoreError::Validation("Defect quantity is out of range".to_string())
        })?;

        if let Some(q) = quantity {
            check_non_negative("quantity", q)?;
            if q != total {
                return Err(CoreError::Validation(format!(
                    "quantity ({q}) must equal quantity_rework ({quantity_rework}) + quantity_nogood ({quantity_nogood})"
                )));
            }
        }

        let replacement = match (is_first_operation, quantity_replacement) {
            (true, r) => {
                let r = r.unwrap_or(0);
                check_non_negative("quantity_replacement", r)?;
                Some(r)
            }
            (false, None) | (false, Some(0)) => None,
            (false, Some(_)) => {
                return Err(CoreError::Validation(
                    "quantity_replacement is only allowed on the first operation".to_string(),
                ))
            }
        };

        Ok(Self {
            quantity: total,
            quantity_rework,
            quantity_nogood,
            quantity_replacement: replacement,
        })
    }

    /// All-zero quantities, used for `add` request snapshots and `delete`
    /// request targets.
    pub fn zero(is_first_operation: bool) -> Self {
        Self {
            quantity: 0,
            quantity_rework: 0,
            quantity_nogood: 0,
            quantity_replacement: is_first_operation.then_some(0),
        }
    }
}

fn check_non_negative(field: &str, value: Quantity) -> Result<(), CoreError> {
    if value < 0 {
        return Err(CoreError::Validation(format!(
            "{field} must be >= 0, got {value}"
        )));
    }
    Ok(())
}

/// A completion snapshot may mention each master defect at most once.
pub fn validate_unique_defect_ids(defect_ids: &[DbId]) -> Result<(), CoreError> {
    for (i, id) in defect_ids.iter().enumerate() {
        if defect_ids[..i].contains(id) {
            return Err(CoreError::Validation(format!(
                "Defect {id} appears more than once in the snapshot"
            )));
        }
    }
    Ok(())
}

/// Master defect names are required and trimmed.
pub fn validate_defect_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Defect name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
