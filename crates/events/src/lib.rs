//! P-Chart event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`event_types`]: names of the events the workflow emits.

pub mod bus;
pub mod event_types;

pub use bus::{EventBus, EventSource, PlatformEvent};
