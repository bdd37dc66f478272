//! Advisory edit locks on production orders.
//!
//! A lock is three nullable columns on the production order row
//! (`editing_user_id`, `editing_user_name`, `locked_at`). It is cooperative:
//! it only blocks clients that go through acquire/release, and it never
//! expires on its own. Locks whose holder no longer exists are reported as
//! orphaned and still need a force-release.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::ActorContext;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// The only lockable resource kind.
pub const RESOURCE_PRODUCTION_ORDER: &str = "productionOrder";

pub const VALID_RESOURCE_TYPES: &[&str] = &[RESOURCE_PRODUCTION_ORDER];

/// Validate the `(resource_type, resource_id)` pair of a lock call.
pub fn validate_resource_ref(resource_type: &str, resource_id: &str) -> Result<(), String> {
    if !VALID_RESOURCE_TYPES.contains(&resource_type) {
        return Err(format!(
            "Invalid resource_type '{resource_type}'. Must be one of: {}",
            VALID_RESOURCE_TYPES.join(", ")
        ));
    }
    if resource_id.trim().is_empty() {
        return Err("resource_id must not be empty".to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lock info
// ---------------------------------------------------------------------------

/// Who holds a lock and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: DbId,
    pub user_name: String,
    pub locked_at: Timestamp,
}

impl LockInfo {
    /// Build from the three lock columns of a production order row.
    ///
    /// All three null means unlocked. A holder id without a timestamp (or the
    /// reverse) breaks the lock invariant and is reported as an internal error.
    pub fn from_columns(
        user_id: Option<DbId>,
        user_name: Option<&str>,
        locked_at: Option<Timestamp>,
    ) -> Result<Option<LockInfo>, CoreError> {
        match (user_id, locked_at) {
            (None, None) => Ok(None),
            (Some(user_id), Some(locked_at)) => Ok(Some(LockInfo {
                user_id,
                user_name: user_name.unwrap_or_default().to_string(),
                locked_at,
            })),
            _ => Err(CoreError::Internal(
                "Inconsistent lock columns: editing_user_id and locked_at must both be set or both be null"
                    .to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Acquire decisions
// ---------------------------------------------------------------------------

/// What an acquire call resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Read-only caller: no lock taken, nothing blocked.
    Bypassed,
    /// The order was unlocked and now belongs to the caller.
    Granted,
    /// The caller already held the lock.
    Reentered,
    /// Someone else holds it.
    Denied(LockInfo),
}

impl AcquireOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, AcquireOutcome::Denied(_))
    }
}

/// Classify an acquire attempt that did not win the unlocked-row update.
///
/// `holder` is the lock as re-read after the failed conditional update;
/// `None` means it was released in between and the caller should retry.
pub fn classify_held(holder: Option<LockInfo>, actor: &ActorContext) -> Option<AcquireOutcome> {
    match holder {
        None => None,
        Some(info) if info.user_id == actor.user_id => Some(AcquireOutcome::Reentered),
        Some(info) => Some(AcquireOutcome::Denied(info)),
    }
}

// ---------------------------------------------------------------------------
// Lock status (read side)
// ---------------------------------------------------------------------------

/// Lock state as shown to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub locked: bool,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub locked_at: Option<Timestamp>,
    /// The recorded holder no longer exists. The lock is still live.
    pub orphaned: bool,
    pub held_by_me: bool,
}

impl LockStatus {
    pub fn new(lock: Option<&LockInfo>, holder_exists: bool, viewer_id: DbId) -> Self {
        match lock {
            None => Self {
                locked: false,
                user_id: None,
                user_name: None,
                locked_at: None,
                orphaned: false,
                held_by_me: false,
            },
            Some(info) => Self {
                locked: true,
                user_id: Some(info.user_id),
                user_name: Some(info.user_name.clone()),
                locked_at: Some(info.locked_at),
                orphaned: !holder_exists,
                held_by_me: info.user_id == viewer_id,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
