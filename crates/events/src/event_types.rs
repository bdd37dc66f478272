//! Well-known event names.
//!
//! Names are kebab-case strings because clients subscribe to them verbatim.

/// A lock was granted to a user who did not already hold it.
pub const LOCK_ACQUIRED: &str = "lock-acquired";

/// The holder released their lock.
pub const LOCK_RELEASED: &str = "lock-released";

/// An admin cleared someone else's lock.
pub const LOCK_FORCE_RELEASED: &str = "lock-force-released";

/// A defect edit request was submitted.
pub const DEFECT_EDIT_REQUESTED: &str = "defect-edit-requested";

/// A defect edit request was approved or rejected.
pub const DEFECT_EDIT_RESOLVED: &str = "defect-edit-resolved";

/// A user's unread notification count changed.
pub const UPDATE_NOTIFICATION_COUNT: &str = "update-notification-count";

/// Source entity kinds attached via [`PlatformEvent::with_source`](crate::PlatformEvent::with_source).
pub const SOURCE_PRODUCTION_ORDER: &str = "production_order";
pub const SOURCE_EDIT_REQUEST: &str = "defect_edit_request";
pub const SOURCE_USER: &str = "user";
