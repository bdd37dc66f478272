//! Operation sequence and per-operation lifecycle rules.
//!
//! Every production order runs through the same fixed sequence of operation
//! codes (OP10, OP20, ...). Each operation moves
//! `NotStarted -> Started -> Completed`; completed is terminal.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{Quantity, Timestamp};

/// Sequence used when `OPERATION_STEPS` is not configured.
pub const DEFAULT_OPERATION_STEPS: &[&str] = &["OP10", "OP20", "OP30", "OP40"];

/// Resource factor recorded when the caller sends none.
pub const DEFAULT_RESOURCE_FACTOR: f64 = 1.0;

/// Parse a comma-separated list of operation codes.
///
/// Codes are trimmed; the list must be non-empty and free of duplicates.
pub fn parse_operation_steps(raw: &str) -> Result<Vec<String>, String> {
    let steps: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if steps.is_empty() {
        return Err("At least one operation step is required".to_string());
    }
    for (i, code) in steps.iter().enumerate() {
        if steps[..i].contains(code) {
            return Err(format!("Duplicate operation step '{code}'"));
        }
    }
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Lifecycle state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationState {
    NotStarted,
    Started,
    Completed,
}

impl OperationState {
    /// Derive the state from the operation's timestamps.
    pub fn from_times(start_time: Option<Timestamp>, end_time: Option<Timestamp>) -> Self {
        match (start_time, end_time) {
            (_, Some(_)) => OperationState::Completed,
            (Some(_), None) => OperationState::Started,
            (None, None) => OperationState::NotStarted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationState::NotStarted => "notStarted",
            OperationState::Started => "started",
            OperationState::Completed => "completed",
        }
    }
}

/// Result of a start check that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    /// Set `start_time` and the input quantity.
    Start,
    /// Already running; starting again changes nothing.
    AlreadyStarted,
}

/// Decide whether `operation_code` may be started.
///
/// `predecessor` is the state of the immediately preceding operation, or
/// `None` for the first operation in the sequence.
pub fn check_can_start(
    current_operation: &str,
    operation_code: &str,
    state: OperationState,
    predecessor: Option<OperationState>,
) -> Result<StartAction, CoreError> {
    match state {
        OperationState::Completed => {
            return Err(CoreError::InvalidTransition(format!(
                "Operation {operation_code} is already completed"
            )))
        }
        OperationState::Started => return Ok(StartAction::AlreadyStarted),
        OperationState::NotStarted => {}
    }

    if let Some(prev) = predecessor {
        if prev != OperationState::Completed {
            return Err(CoreError::InvalidTransition(format!(
                "Operation {operation_code} cannot start before the preceding operation is completed"
            )));
        }
    }

    if operation_code != current_operation {
        return Err(CoreError::InvalidTransition(format!(
            "Operation {operation_code} is not the current operation ({current_operation})"
        )));
    }

    Ok(StartAction::Start)
}

/// Decide whether an operation in `state` may be completed.
pub fn check_can_complete(operation_code: &str, state: OperationState) -> Result<(), CoreError> {
    match state {
        OperationState::Started => Ok(()),
        OperationState::NotStarted => Err(CoreError::InvalidTransition(format!(
            "Operation {operation_code} has not been started"
        ))),
        OperationState::Completed => Err(CoreError::InvalidTransition(format!(
            "Operation {operation_code} is already completed"
        ))),
    }
}

/// Input quantity for an operation being started: the predecessor's output,
/// or the ordered quantity for the first operation.
pub fn start_input_quantity(
    order_quantity: Quantity,
    predecessor_output: Option<Quantity>,
) -> Quantity {
    predecessor_output.unwrap_or(order_quantity)
}

// ---------------------------------------------------------------------------
// Completion inputs
// ---------------------------------------------------------------------------

/// A completion must name the production line. Returns the trimmed value.
pub fn validate_line_no(line_no: &str) -> Result<String, CoreError> {
    let trimmed = line_no.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "line_no is required to complete an operation".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_resource_factor(rf: f64) -> Result<(), CoreError> {
    if !rf.is_finite() || rf <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Resource factor must be a positive number, got {rf}"
        )));
    }
    Ok(())
}

/// A client-supplied completion time may not precede the start.
pub fn validate_end_time(start_time: Timestamp, end_time: Timestamp) -> Result<(), CoreError> {
    if end_time < start_time {
        return Err(CoreError::Validation(format!(
            "Completion time {end_time} is before the operation start {start_time}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Defect ledger writes
// ---------------------------------------------------------------------------

/// Decide whether the defect ledger of an operation may be written directly.
///
/// Nothing is recorded before the operation starts. Once it is completed only
/// privileged users may write directly; everyone else goes through an edit
/// request.
pub fn check_ledger_writable(
    operation_code: &str,
    state: OperationState,
    privileged: bool,
) -> Result<(), CoreError> {
    match state {
        OperationState::NotStarted => Err(CoreError::InvalidTransition(format!(
            "Operation {operation_code} has not been started"
        ))),
        OperationState::Started => Ok(()),
        OperationState::Completed if privileged => Ok(()),
        OperationState::Completed => Err(CoreError::Forbidden(format!(
            "Operation {operation_code} is completed; submit an edit request instead"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn parse_steps_trims_and_keeps_order() {
        let steps = parse_operation_steps(" OP10, OP20 ,OP30").unwrap();
        assert_eq!(steps, vec!["OP10", "OP20", "OP30"]);
    }

    #[test]
    fn parse_steps_rejects_empty_and_duplicates() {
        assert!(parse_operation_steps(" , ").is_err());
        assert!(parse_operation_steps("OP10,OP20,OP10")
            .unwrap_err()
            .contains("Duplicate"));
    }

    #[test]
    fn default_steps_parse() {
        let joined = DEFAULT_OPERATION_STEPS.join(",");
        assert_eq!(parse_operation_steps(&joined).unwrap().len(), 4);
    }

    #[test]
    fn state_from_times() {
        let now = Utc::now();
        assert_eq!(OperationState::from_times(None, None), OperationState::NotStarted);
        assert_eq!(OperationState::from_times(Some(now), None), OperationState::Started);
        assert_eq!(
            OperationState::from_times(Some(now), Some(now)),
            OperationState::Completed
        );
    }

    #[test]
    fn first_operation_can_start() {
        assert_eq!(
            check_can_start("OP10", "OP10", OperationState::NotStarted, None).unwrap(),
            StartAction::Start
        );
    }

    #[test]
    fn next_operation_starts_after_predecessor_completes() {
        assert_eq!(
            check_can_start(
                "OP20",
                "OP20",
                OperationState::NotStarted,
                Some(OperationState::Completed)
            )
            .unwrap(),
            StartAction::Start
        );
    }

    #[test]
    fn cannot_skip_ahead() {
        assert_matches!(
            check_can_start(
                "OP10",
                "OP20",
                OperationState::NotStarted,
                Some(OperationState::Started)
            ),
            Err(CoreError::InvalidTransition(_))
        );
        assert_matches!(
            check_can_start(
                "OP10",
                "OP20",
                OperationState::NotStarted,
                Some(OperationState::NotStarted)
            ),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn non_current_operation_cannot_start() {
        assert_matches!(
            check_can_start(
                "OP20",
                "OP30",
                OperationState::NotStarted,
                Some(OperationState::Completed)
            ),
            Err(CoreError::InvalidTransition(msg)) if msg.contains("not the current operation")
        );
    }

    #[test]
    fn second_start_is_a_no_op() {
        assert_eq!(
            check_can_start("OP10", "OP10", OperationState::Started, None).unwrap(),
            StartAction::AlreadyStarted
        );
    }

    #[test]
    fn completed_operation_cannot_restart() {
        assert_matches!(
            check_can_start("OP20", "OP10", OperationState::Completed, None),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn complete_requires_started() {
        assert!(check_can_complete("OP10", OperationState::Started).is_ok());
        assert_matches!(
            check_can_complete("OP10", OperationState::NotStarted),
            Err(CoreError::InvalidTransition(msg)) if msg.contains("not been started")
        );
        assert_matches!(
            check_can_complete("OP10", OperationState::Completed),
            Err(CoreError::InvalidTransition(msg)) if msg.contains("already completed")
        );
    }

    #[test]
    fn input_quantity_comes_from_predecessor() {
        assert_eq!(start_input_quantity(100, None), 100);
        assert_eq!(start_input_quantity(100, Some(95)), 95);
    }

    #[test]
    fn line_no_is_required() {
        assert_eq!(validate_line_no(" L1 ").unwrap(), "L1");
        assert_matches!(validate_line_no(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_line_no("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn resource_factor_must_be_positive() {
        assert!(validate_resource_factor(1.0).is_ok());
        assert!(validate_resource_factor(0.5).is_ok());
        assert!(validate_resource_factor(0.0).is_err());
        assert!(validate_resource_factor(-2.0).is_err());
        assert!(validate_resource_factor(f64::NAN).is_err());
    }

    #[test]
    fn ledger_writes_follow_operation_state() {
        assert_matches!(
            check_ledger_writable("OP10", OperationState::NotStarted, true),
            Err(CoreError::InvalidTransition(_))
        );
        assert!(check_ledger_writable("OP10", OperationState::Started, false).is_ok());
        assert!(check_ledger_writable("OP10", OperationState::Completed, true).is_ok());
        assert_matches!(
            check_ledger_writable("OP10", OperationState::Completed, false),
            Err(CoreError::Forbidden(msg)) if msg.contains("edit request")
        );
    }

    #[test]
    fn end_time_not_before_start() {
        let start = Utc::now();
        assert!(validate_end_time(start, start).is_ok());
        assert!(validate_end_time(start, start + Duration::minutes(5)).is_ok());
        assert!(validate_end_time(start, start - Duration::minutes(5)).is_err());
    }
}
