//! Well-known role names and the acting-user context.
//!
//! Role names must match the `ck_users_role` check constraint in the
//! `create_users` migration.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_VIEWER: &str = "viewer";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER, ROLE_VIEWER];

pub fn validate_role(role: &str) -> Result<(), String> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        ))
    }
}

/// Who is performing a workflow call.
///
/// Passed explicitly into every lock, operation and edit-request call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: DbId,
    pub user_name: String,
    pub role: String,
}

impl ActorContext {
    pub fn new(user_id: DbId, user_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            role: role.into(),
        }
    }

    /// Admins may force-release locks, resolve edit requests and write
    /// directly to completed operations.
    pub fn is_privileged(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Viewers have read-only access.
    pub fn is_viewer(&self) -> bool {
        self.role == ROLE_VIEWER
    }

    pub fn require_privileged(&self, action: &str) -> Result<(), CoreError> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!("Admin role required to {action}")))
        }
    }

    pub fn require_editor(&self, action: &str) -> Result<(), CoreError> {
        if self.is_viewer() {
            Err(CoreError::Forbidden(format!(
                "Viewers have read-only access and cannot {action}"
            )))
        } else {
            Ok(())
        }
    }
}
