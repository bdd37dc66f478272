//! Notification routing infrastructure.
//!
//! The [`NotificationRouter`] subscribes to the event bus, stores in-app
//! notifications for the users an event concerns, and announces their new
//! unread counts.

pub mod router;

pub use router::NotificationRouter;
