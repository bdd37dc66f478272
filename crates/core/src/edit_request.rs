//! Defect edit request workflow.
//!
//! Once an operation is completed, its ledger changes only through requests:
//! `add`, `edit` or `delete` one entry. Each request goes
//! `pending -> approved | rejected` exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Request type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Add,
    #[default]
    Edit,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Add => "add",
            RequestType::Edit => "edit",
            RequestType::Delete => "delete",
        }
    }

    /// `edit` and `delete` point at an existing ledger entry; `add` does not.
    pub fn needs_target(self) -> bool {
        !matches!(self, RequestType::Add)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(RequestType::Add),
            "edit" => Ok(RequestType::Edit),
            "delete" => Ok(RequestType::Delete),
            other => Err(CoreError::Validation(format!(
                "Invalid request_type '{other}'. Must be one of: add, edit, delete"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Must be one of: pending, approved, rejected"
            ))),
        }
    }
}

/// Parse the decision sent to the resolve endpoint.
///
/// Only terminal statuses are decisions; `pending` is rejected.
pub fn parse_decision(status: &str) -> Result<RequestStatus, CoreError> {
    let parsed: RequestStatus = status.parse()?;
    if !parsed.is_terminal() {
        return Err(CoreError::Validation(
            "Decision must be 'approved' or 'rejected'".to_string(),
        ));
    }
    Ok(parsed)
}

/// Check that a request in `current` may still be resolved.
pub fn check_can_resolve(current: RequestStatus) -> Result<(), CoreError> {
    if current.is_terminal() {
        return Err(CoreError::InvalidTransition(format!(
            "Edit request is already {current}"
        )));
    }
    Ok(())
}

pub fn validate_reason(reason: &str) -> Result<String, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "A reason is required for an edit request".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Status filter for the request list. `all` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Only(RequestStatus),
    All,
}

impl StatusFilter {
    /// Parse `?status=`; a missing value defaults to `pending`.
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw {
            None | Some("") => Ok(StatusFilter::Only(RequestStatus::Pending)),
            Some("all") => Ok(StatusFilter::All),
            Some(s) => Ok(StatusFilter::Only(s.parse()?)),
        }
    }
}

/// Sortable request attributes, mapped to their column names.
pub const SORTABLE_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "resolved_at",
    "status",
    "request_type",
    "requester_id",
    "resolver_id",
    "production_order_id",
    "operation_id",
    "defect_id",
    "requested_quantity",
    "current_quantity",
];

pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated `ORDER BY` for the request list. Field names come from
/// [`SORTABLE_FIELDS`] only, so they are safe to interpolate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn parse(field: Option<&str>, direction: Option<&str>) -> Result<Self, CoreError> {
        let field = match field {
            None | Some("") => DEFAULT_SORT_FIELD,
            Some(f) => SORTABLE_FIELDS
                .iter()
                .copied()
                .find(|known| *known == f)
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "Invalid sort_field '{f}'. Must be one of: {}",
                        SORTABLE_FIELDS.join(", ")
                    ))
                })?,
        };
        let direction = match direction.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(other) => {
                return Err(CoreError::Validation(format!(
                    "Invalid sort_direction '{other}'. Must be 'asc' or 'desc'"
                )))
            }
        };
        Ok(Self { field, direction })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
