//! Quantity cascade: output of an operation from its input and defect ledger.
//!
//! `output = input - sum(no-good) + sum(replacement)`, where replacement only
//! counts on the first operation. Rework never reduces output.
//!
//! The output is computed once, when the operation completes, and becomes the
//! next operation's input at that moment. Later ledger changes (approved edit
//! requests, admin direct writes) do not recompute it or touch downstream
//! operations.

use crate::defect::DefectQuantities;
use crate::error::CoreError;
use crate::types::Quantity;

/// Compute an operation's output quantity.
///
/// Fails with a validation error if the ledger removes more units than the
/// operation received.
pub fn compute_output<'a, I>(
    input_quantity: Quantity,
    ledger: I,
    is_first_operation: bool,
) -> Result<Quantity, CoreError>
where
    I: IntoIterator<Item = &'a DefectQuantities>,
{
    let mut nogood: i64 = 0;
    let mut replacement: i64 = 0;
    for entry in ledger {
        nogood += i64::from(entry.quantity_nogood);
        if is_first_operation {
            replacement += i64::from(entry.quantity_replacement.unwrap_or(0));
        }
    }

    let output = i64::from(input_quantity) - nogood + replacement;
    if output < 0 {
        return Err(CoreError::Validation(format!(
            "No-good total ({nogood}) exceeds the operation input ({input_quantity}) plus replacements ({replacement})"
        )));
    }
    Quantity::try_from(output)
        .map_err(|_| CoreError::Validation(format!("Output quantity {output} is out of range")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn entry(rework: Quantity, nogood: Quantity, replacement: Option<Quantity>) -> DefectQuantities {
        DefectQuantities {
            quantity: rework + nogood,
            quantity_rework: rework,
            quantity_nogood: nogood,
            quantity_replacement: replacement,
        }
    }

    #[test]
    fn no_defects_passes_input_through() {
        let ledger: Vec<DefectQuantities> = Vec::new();
        assert_eq!(compute_output(100, &ledger, true).unwrap(), 100);
    }

    #[test]
    fn nogood_subtracts_rework_does_not() {
        let ledger = [entry(0, 5, None), entry(7, 0, None), entry(2, 3, None)];
        assert_eq!(compute_output(100, &ledger, false).unwrap(), 92);
    }

    #[test]
    fn replacement_adds_back_on_first_operation() {
        let ledger = [entry(0, 5, Some(2)), entry(1, 1, Some(1))];
        assert_eq!(compute_output(100, &ledger, true).unwrap(), 97);
    }

    #[test]
    fn replacement_ignored_after_first_operation() {
        let ledger = [entry(0, 5, Some(2))];
        assert_eq!(compute_output(100, &ledger, false).unwrap(), 95);
    }

    #[test]
    fn zero_quantity_entries_are_harmless() {
        let ledger = [entry(0, 0, Some(0)), entry(0, 5, Some(0))];
        assert_eq!(compute_output(100, &ledger, true).unwrap(), 95);
    }

    #[test]
    fn output_cannot_go_negative() {
        let ledger = [entry(0, 11, None)];
        assert_matches!(
            compute_output(10, &ledger, false),
            Err(CoreError::Validation(msg)) if msg.contains("exceeds")
        );
    }

    #[test]
    fn output_can_reach_zero() {
        let ledger = [entry(0, 10, None)];
        assert_eq!(compute_output(10, &ledger, false).unwrap(), 0);
    }
}
