//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] consumes [`PlatformEvent`]s, decides who should hear
//! about each one, persists a notification per recipient and then publishes
//! `update-notification-count` for every recipient. Delivery failures are
//! logged and never reach the request that caused the event.

use std::sync::{Arc, Weak};

use pchart_core::types::DbId;
use pchart_db::models::notification::CreateNotification;
use pchart_db::repositories::{NotificationRepo, UserRepo};
use pchart_db::DbPool;
use pchart_events::{event_types, EventBus, PlatformEvent};
use tokio::sync::broadcast;

/// Who an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    Users(Vec<DbId>),
    /// Every active admin except the actor.
    ActiveAdmins,
}

/// Routing decision for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub recipients: Recipients,
    pub message: String,
}

/// Decide who hears about `event` and what they are told.
///
/// Returns `None` for events that produce no notification.
pub fn plan_delivery(event: &PlatformEvent) -> Option<DeliveryPlan> {
    match event.event_type.as_str() {
        event_types::DEFECT_EDIT_RESOLVED => {
            let requester = event.payload_id("requester_id")?;
            let request_id = event.payload_id("request_id")?;
            let status = event.payload_str("status").unwrap_or("resolved");
            Some(DeliveryPlan {
                recipients: Recipients::Users(vec![requester]),
                message: format!("Your defect edit request #{request_id} was {status}"),
            })
        }
        event_types::DEFECT_EDIT_REQUESTED => {
            let request_id = event.payload_id("request_id")?;
            let request_type = event.payload_str("request_type").unwrap_or("edit");
            Some(DeliveryPlan {
                recipients: Recipients::ActiveAdmins,
                message: format!("New defect {request_type} request #{request_id} awaits review"),
            })
        }
        event_types::LOCK_FORCE_RELEASED => {
            let previous = event.payload_id("previous_user_id")?;
            let order_number = event.payload_str("order_number").unwrap_or("?");
            Some(DeliveryPlan {
                recipients: Recipients::Users(vec![previous]),
                message: format!("Your lock on production order {order_number} was released by an admin"),
            })
        }
        _ => None,
    }
}

/// Routes platform events to per-user notifications.
///
/// Holds only a weak handle on the bus so that dropping the last strong
/// handle closes the channel and ends [`run`](Self::run).
pub struct NotificationRouter {
    pool: DbPool,
    event_bus: Weak<EventBus>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, event_bus: &Arc<EventBus>) -> Self {
        Self {
            pool,
            event_bus: Arc::downgrade(event_bus),
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed, i.e. once every
    /// [`EventBus`] handle has been dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Persist notifications for one event and announce the new counts.
    pub async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        let Some(plan) = plan_delivery(event) else {
            return Ok(());
        };

        let targets = self.determine_targets(&plan.recipients, event).await?;
        for user_id in targets {
            NotificationRepo::create(
                &self.pool,
                &CreateNotification {
                    user_id,
                    event_type: event.event_type.clone(),
                    message: plan.message.clone(),
                    payload: event.payload.clone(),
                },
            )
            .await?;
            self.publish_count(user_id).await?;
        }
        Ok(())
    }

    async fn determine_targets(
        &self,
        recipients: &Recipients,
        event: &PlatformEvent,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        match recipients {
            Recipients::Users(ids) => Ok(ids.clone()),
            Recipients::ActiveAdmins => {
                let admins = UserRepo::list_active_admin_ids(&self.pool).await?;
                Ok(admins
                    .into_iter()
                    .filter(|id| Some(*id) != event.actor_user_id)
                    .collect())
            }
        }
    }

    async fn publish_count(&self, user_id: DbId) -> Result<(), sqlx::Error> {
        let Some(bus) = self.event_bus.upgrade() else {
            return Ok(());
        };
        let unread = NotificationRepo::unread_count(&self.pool, user_id).await?;
        publish_unread_count(&bus, user_id, unread);
        Ok(())
    }
}

/// Announce a user's unread notification count.
pub fn publish_unread_count(bus: &EventBus, user_id: DbId, unread_count: i64) {
    bus.publish(
        PlatformEvent::new(event_types::UPDATE_NOTIFICATION_COUNT)
            .with_source(event_types::SOURCE_USER, user_id)
            .with_payload(serde_json::json!({
                "user_id": user_id,
                "unread_count": unread_count,
            })),
    );
}
