use crate::lock::LockInfo;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a human-entered key (order number, operation code).
    #[error("Entity not found: {entity} '{key}'")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A lifecycle edge that is not allowed from the current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// The production order is held by another user.
    #[error("Locked by {} since {}", .0.user_name, .0.locked_at)]
    Locked(Box<LockInfo>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found_key(entity: &'static str, key: impl Into<String>) -> Self {
        CoreError::NotFoundByKey {
            entity,
            key: key.into(),
        }
    }
}
