//! Lock and edit-request events, fanned out over `tokio::sync::broadcast`.

use chrono::{DateTime, Utc};
use pchart_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// The record an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    /// One of the `SOURCE_*` constants in [`event_types`](crate::event_types).
    pub kind: String,
    pub id: DbId,
}

/// Envelope for everything published on the bus.
///
/// ```rust
/// use pchart_events::{event_types, PlatformEvent};
///
/// let event = PlatformEvent::new(event_types::LOCK_RELEASED)
///     .with_source(event_types::SOURCE_PRODUCTION_ORDER, 3)
///     .with_actor(9)
///     .with_payload(serde_json::json!({"order_number": "PO-7", "user_id": 9}));
/// assert_eq!(event.payload_str("order_number"), Some("PO-7"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// One of the names in [`event_types`](crate::event_types).
    pub event_type: String,
    pub source: Option<EventSource>,
    /// User whose request caused the event.
    pub actor_user_id: Option<DbId>,
    /// Event-specific fields. Always a JSON object.
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(serde_json::Map::new()),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, kind: impl Into<String>, id: DbId) -> Self {
        self.source = Some(EventSource {
            kind: kind.into(),
            id,
        });
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Numeric payload field, `None` when absent or not an integer.
    pub fn payload_id(&self, key: &str) -> Option<DbId> {
        self.payload.get(key)?.as_i64()
    }

    /// String payload field, `None` when absent or not a string.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key)?.as_str()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Events buffered per subscriber before the slowest one starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub shared as `Arc<EventBus>` between request handlers and the
/// notification router.
///
/// Publishing never blocks a request. A subscriber that falls more than the
/// channel capacity behind loses the oldest events and sees
/// `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every live subscriber and return how many there were.
    /// With nobody listening the event is dropped.
    pub fn publish(&self, event: PlatformEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(event_type = %event.event_type, "No subscribers for event");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_types;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = PlatformEvent::new(event_types::LOCK_ACQUIRED)
            .with_source(event_types::SOURCE_PRODUCTION_ORDER, 42)
            .with_actor(7)
            .with_payload(serde_json::json!({"order_number": "PO-1", "user_id": 7}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "lock-acquired");
        assert_eq!(
            received.source,
            Some(EventSource {
                kind: "production_order".to_string(),
                id: 42,
            })
        );
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload_str("order_number"), Some("PO-1"));
        assert_eq!(received.payload_id("user_id"), Some(7));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let delivered = bus.publish(PlatformEvent::new(event_types::DEFECT_EDIT_RESOLVED));
        assert_eq!(delivered, 2);

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "defect-edit-resolved");
        assert_eq!(e2.event_type, "defect-edit-resolved");
    }

    #[test]
    fn publish_with_no_subscribers_is_dropped() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(PlatformEvent::new(event_types::LOCK_RELEASED)), 0);
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn payload_accessors_tolerate_missing_keys() {
        let event = PlatformEvent::new("bare")
            .with_payload(serde_json::json!({"user_id": "not-a-number"}));
        assert!(event.payload_id("user_id").is_none());
        assert!(event.payload_id("missing").is_none());
        assert!(event.payload_str("missing").is_none());
        assert!(event.source.is_none());
        assert!(event.actor_user_id.is_none());
    }
}
