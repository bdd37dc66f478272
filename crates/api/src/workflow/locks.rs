//! Advisory edit locks on production orders.
//!
//! Locks are cooperative: they only block other clients that go through
//! acquire. They never expire; the holder releases them or an admin
//! force-releases them.

use pchart_core::error::CoreError;
use pchart_core::lock::{classify_held, AcquireOutcome, LockInfo, LockStatus};
use pchart_core::roles::ActorContext;
use pchart_db::repositories::{OrderLockRepo, UserRepo};
use pchart_db::DbPool;
use pchart_events::{event_types, EventBus, PlatformEvent};
use serde::Serialize;

use super::{load_order, ENTITY_ORDER};
use crate::error::AppResult;

/// Attempts before giving up when the lock keeps changing hands between the
/// conditional update and the re-read.
const MAX_ACQUIRE_ATTEMPTS: usize = 3;

/// Successful acquire. A lock held by someone else is reported as
/// [`CoreError::Locked`] instead.
#[derive(Debug, Clone, Serialize)]
pub struct LockResult {
    pub success: bool,
    /// `granted`, `reentered` or `bypassed`.
    pub outcome: &'static str,
    /// Current lock on the order, if any.
    pub lock: Option<LockInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseResult {
    pub released: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceReleaseResult {
    pub released: bool,
    /// Who held the lock before it was cleared.
    pub previous: Option<LockInfo>,
}

fn outcome_name(outcome: &AcquireOutcome) -> &'static str {
    match outcome {
        AcquireOutcome::Bypassed => "bypassed",
        AcquireOutcome::Granted => "granted",
        AcquireOutcome::Reentered => "reentered",
        AcquireOutcome::Denied(_) => "denied",
    }
}

/// Take the edit lock on `order_number` for `actor`.
///
/// Viewers never take or wait for a lock. Re-acquiring a lock already held
/// by the caller succeeds without changing `locked_at`.
pub async fn acquire(
    pool: &DbPool,
    bus: &EventBus,
    actor: &ActorContext,
    order_number: &str,
) -> AppResult<LockResult> {
    if actor.is_viewer() {
        let order = load_order(pool, order_number).await?;
        return Ok(LockResult {
            success: true,
            outcome: outcome_name(&AcquireOutcome::Bypassed),
            lock: order.lock_info()?,
        });
    }

    for _ in 0..MAX_ACQUIRE_ATTEMPTS {
        if let Some(order) =
            OrderLockRepo::try_lock(pool, order_number, actor.user_id, &actor.user_name).await?
        {
            let lock = order.lock_info()?;
            tracing::info!(
                order_number,
                user_id = actor.user_id,
                "Lock acquired"
            );
            bus.publish(
                PlatformEvent::new(event_types::LOCK_ACQUIRED)
                    .with_source(event_types::SOURCE_PRODUCTION_ORDER, order.id)
                    .with_actor(actor.user_id)
                    .with_payload(serde_json::json!({
                        "order_number": order.order_number,
                        "user_id": actor.user_id,
                        "user_name": actor.user_name,
                    })),
            );
            return Ok(LockResult {
                success: true,
                outcome: outcome_name(&AcquireOutcome::Granted),
                lock,
            });
        }

        // Either the order is missing or someone holds the lock.
        let order = load_order(pool, order_number).await?;
        let holder = order.lock_info()?;
        match classify_held(holder.clone(), actor) {
            Some(AcquireOutcome::Denied(info)) => {
                tracing::debug!(
                    order_number,
                    user_id = actor.user_id,
                    holder_id = info.user_id,
                    "Lock denied"
                );
                return Err(CoreError::Locked(Box::new(info)).into());
            }
            Some(outcome) => {
                return Ok(LockResult {
                    success: true,
                    outcome: outcome_name(&outcome),
                    lock: holder,
                });
            }
            // Released between the update and the re-read.
            None => continue,
        }
    }

    Err(CoreError::Conflict(format!(
        "Lock on {ENTITY_ORDER} '{order_number}' changed hands repeatedly; try again"
    ))
    .into())
}

/// Release the caller's lock. A non-holder's release changes nothing and
/// is not an error.
pub async fn release(
    pool: &DbPool,
    bus: &EventBus,
    actor: &ActorContext,
    order_number: &str,
) -> AppResult<ReleaseResult> {
    let order = load_order(pool, order_number).await?;
    let released = OrderLockRepo::release(pool, order_number, actor.user_id).await?;

    if released {
        tracing::info!(order_number, user_id = actor.user_id, "Lock released");
        bus.publish(
            PlatformEvent::new(event_types::LOCK_RELEASED)
                .with_source(event_types::SOURCE_PRODUCTION_ORDER, order.id)
                .with_actor(actor.user_id)
                .with_payload(serde_json::json!({
                    "order_number": order.order_number,
                    "user_id": actor.user_id,
                })),
        );
    }

    Ok(ReleaseResult { released })
}

/// Clear the lock regardless of holder. Admin only.
pub async fn force_release(
    pool: &DbPool,
    bus: &EventBus,
    actor: &ActorContext,
    order_number: &str,
) -> AppResult<ForceReleaseResult> {
    actor.require_privileged("force-release a lock")?;

    let (order_id, previous) = OrderLockRepo::force_release(pool, order_number)
        .await?
        .ok_or_else(|| CoreError::not_found_key(ENTITY_ORDER, order_number))?;

    if let Some(prev) = &previous {
        tracing::warn!(
            order_number,
            admin_id = actor.user_id,
            previous_user_id = prev.user_id,
            "Lock force-released"
        );
        bus.publish(
            PlatformEvent::new(event_types::LOCK_FORCE_RELEASED)
                .with_source(event_types::SOURCE_PRODUCTION_ORDER, order_id)
                .with_actor(actor.user_id)
                .with_payload(serde_json::json!({
                    "order_number": order_number,
                    "previous_user_id": prev.user_id,
                    "previous_user_name": prev.user_name,
                })),
        );
    }

    Ok(ForceReleaseResult {
        released: previous.is_some(),
        previous,
    })
}

/// Lock state as seen by `actor`, including orphan detection.
pub async fn status(pool: &DbPool, actor: &ActorContext, order_number: &str) -> AppResult<LockStatus> {
    let order = load_order(pool, order_number).await?;
    let lock = order.lock_info()?;
    let holder_exists = match &lock {
        Some(info) => UserRepo::exists(pool, info.user_id).await?,
        None => true,
    };
    Ok(LockStatus::new(lock.as_ref(), holder_exists, actor.user_id))
}
