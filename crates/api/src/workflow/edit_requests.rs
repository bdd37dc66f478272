//! Defect edit requests against completed operations.
//!
//! A request snapshots the ledger entry it targets, waits in `pending`, and is
//! resolved exactly once by an admin. Approval applies the requested change to
//! the ledger in the same transaction that resolves the request. The
//! operation's stored output quantity is left as it was.

use pchart_core::defect::DefectQuantities;
use pchart_core::edit_request::{
    check_can_resolve, parse_decision, validate_reason, RequestStatus, RequestType, SortSpec,
    StatusFilter,
};
use pchart_core::error::CoreError;
use pchart_core::operation::OperationState;
use pchart_core::roles::ActorContext;
use pchart_core::types::DbId;
use pchart_db::models::defect::OperationDefect;
use pchart_db::models::edit_request::{
    CreateEditRequest, DefectEditRequest, NewEditRequest, ResolveEditRequest,
};
use pchart_db::models::operation::Operation;
use pchart_db::repositories::{EditRequestRepo, OperationDefectRepo, OperationRepo};
use pchart_db::DbPool;
use pchart_events::{event_types, EventBus, PlatformEvent};
use serde::Deserialize;
use sqlx::PgConnection;

use super::{
    ensure_master_defects_exist, ENTITY_EDIT_REQUEST, ENTITY_OPERATION, ENTITY_OPERATION_DEFECT,
};
use crate::error::AppResult;

/// Query parameters for `GET /edit-requests`.
#[derive(Debug, Deserialize)]
pub struct ListEditRequestsParams {
    pub status: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
}

fn request_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY_EDIT_REQUEST,
        id,
    }
}

async fn find_operation(pool: &DbPool, id: DbId) -> AppResult<Operation> {
    OperationRepo::find_by_id(pool, id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: ENTITY_OPERATION,
            id,
        }
        .into()
    })
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Submit an edit request.
///
/// `add` names an operation and a master defect that is not yet in its
/// ledger; `edit` and `delete` name an existing ledger entry.
pub async fn create(
    pool: &DbPool,
    bus: &EventBus,
    actor: &ActorContext,
    input: CreateEditRequest,
) -> AppResult<DefectEditRequest> {
    actor.require_editor("submit edit requests")?;
    let reason = validate_reason(&input.reason)?;
    let request_type = input.request_type;

    let (operation, target, defect_id): (Operation, Option<OperationDefect>, DbId) =
        if request_type.needs_target() {
            let target_id = input.operation_defect_id.ok_or_else(|| {
                CoreError::Validation(format!(
                    "operation_defect_id is required for a {request_type} request"
                ))
            })?;
            let target = OperationDefectRepo::find_by_id(pool, target_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: ENTITY_OPERATION_DEFECT,
                    id: target_id,
                })?;
            let operation = find_operation(pool, target.operation_id).await?;
            let defect_id = target.defect_id;
            (operation, Some(target), defect_id)
        } else {
            let (operation_id, defect_id) = match (input.operation_id, input.defect_id) {
                (Some(op), Some(defect)) => (op, defect),
                _ => {
                    return Err(CoreError::Validation(
                        "operation_id and defect_id are required for an add request".to_string(),
                    )
                    .into())
                }
            };
            let operation = find_operation(pool, operation_id).await?;
            ensure_master_defects_exist(pool, &[defect_id]).await?;
            if OperationDefectRepo::find_by_operation_and_defect(pool, operation_id, defect_id)
                .await?
                .is_some()
            {
                return Err(CoreError::Conflict(format!(
                    "Defect {defect_id} is already recorded on operation {}; request an edit instead",
                    operation.operation_code
                ))
                .into());
            }
            (operation, None, defect_id)
        };

    let state = operation.state();
    if state != OperationState::Completed {
        return Err(CoreError::InvalidTransition(format!(
            "Edit requests are only accepted for completed operations; {} is {}",
            operation.operation_code,
            state.as_str()
        ))
        .into());
    }

    let is_first = operation.is_first();
    let current = target
        .as_ref()
        .map(OperationDefect::quantities)
        .unwrap_or_else(|| DefectQuantities::zero(is_first));
    let requested = match request_type {
        RequestType::Delete => DefectQuantities::zero(is_first),
        RequestType::Add | RequestType::Edit => DefectQuantities::new(
            input.quantity,
            input.quantity_rework,
            input.quantity_nogood,
            input.quantity_replacement,
            is_first,
        )?,
    };

    let request = EditRequestRepo::create(
        pool,
        &NewEditRequest {
            operation_defect_id: target.map(|t| t.id),
            operation_id: operation.id,
            production_order_id: operation.production_order_id,
            defect_id,
            requester_id: actor.user_id,
            request_type,
            current,
            requested,
            reason,
        },
    )
    .await?;

    tracing::info!(
        request_id = request.id,
        request_type = %request_type,
        requester_id = actor.user_id,
        operation_id = operation.id,
        "Edit request submitted"
    );
    bus.publish(
        PlatformEvent::new(event_types::DEFECT_EDIT_REQUESTED)
            .with_source(event_types::SOURCE_EDIT_REQUEST, request.id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "request_id": request.id,
                "requester_id": actor.user_id,
                "request_type": request_type.as_str(),
            })),
    );

    Ok(request)
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// List requests. Admins see all of them; everyone else sees their own.
pub async fn list(
    pool: &DbPool,
    actor: &ActorContext,
    params: &ListEditRequestsParams,
) -> AppResult<Vec<DefectEditRequest>> {
    let filter = StatusFilter::parse(params.status.as_deref())?;
    let sort = SortSpec::parse(params.sort_field.as_deref(), params.sort_direction.as_deref())?;
    let requester = (!actor.is_privileged()).then_some(actor.user_id);
    Ok(EditRequestRepo::list(pool, filter, &sort, requester).await?)
}

pub async fn get(pool: &DbPool, actor: &ActorContext, id: DbId) -> AppResult<DefectEditRequest> {
    let request = EditRequestRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| request_not_found(id))?;
    if !actor.is_privileged() && request.requester_id != actor.user_id {
        return Err(CoreError::Forbidden(
            "You can only view your own edit requests".to_string(),
        )
        .into());
    }
    Ok(request)
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Approve or reject a pending request. Admin only.
///
/// The request is claimed with a conditional update before the ledger is
/// touched, so concurrent resolvers apply an approval at most once. Any
/// failure while applying rolls the claim back and the request stays pending.
pub async fn resolve(
    pool: &DbPool,
    bus: &EventBus,
    actor: &ActorContext,
    id: DbId,
    input: ResolveEditRequest,
) -> AppResult<DefectEditRequest> {
    actor.require_privileged("resolve edit requests")?;
    let decision = parse_decision(&input.status)?;
    let note = input
        .comments
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut tx = pool.begin().await?;

    let existing = EditRequestRepo::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| request_not_found(id))?;
    check_can_resolve(existing.request_status()?)?;

    let resolved = EditRequestRepo::resolve_pending(&mut tx, id, decision, actor.user_id, note)
        .await?
        .ok_or_else(|| {
            CoreError::InvalidTransition(format!("Edit request {id} was already resolved"))
        })?;

    if decision == RequestStatus::Approved {
        apply_approved(&mut tx, &resolved).await?;
    }

    tx.commit().await?;

    tracing::info!(
        request_id = id,
        status = %decision,
        resolver_id = actor.user_id,
        "Edit request resolved"
    );
    bus.publish(
        PlatformEvent::new(event_types::DEFECT_EDIT_RESOLVED)
            .with_source(event_types::SOURCE_EDIT_REQUEST, id)
            .with_actor(actor.user_id)
            .with_payload(serde_json::json!({
                "request_id": id,
                "requester_id": resolved.requester_id,
                "status": decision.as_str(),
                "resolver_id": actor.user_id,
            })),
    );

    Ok(resolved)
}

async fn apply_approved(conn: &mut PgConnection, request: &DefectEditRequest) -> AppResult<()> {
    let requested = request.requested();
    match request.request_type()? {
        RequestType::Add => {
            let existing = OperationDefectRepo::find_by_operation_and_defect(
                &mut *conn,
                request.operation_id,
                request.defect_id,
            )
            .await?;
            if existing.is_some() {
                return Err(CoreError::Conflict(format!(
                    "Defect {} was recorded on operation {} after the request was submitted",
                    request.defect_id, request.operation_id
                ))
                .into());
            }
            // A concurrent add for the same defect fails on the unique key.
            OperationDefectRepo::insert(
                &mut *conn,
                request.operation_id,
                request.defect_id,
                &requested,
            )
            .await?;
        }
        RequestType::Edit => {
            let target = target_id(request)?;
            OperationDefectRepo::update_quantities(&mut *conn, target, &requested)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: ENTITY_OPERATION_DEFECT,
                    id: target,
                })?;
        }
        RequestType::Delete => {
            let target = target_id(request)?;
            if !OperationDefectRepo::delete(&mut *conn, target).await? {
                return Err(CoreError::NotFound {
                    entity: ENTITY_OPERATION_DEFECT,
                    id: target,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// The ledger entry an edit or delete request points at. It may no longer
/// exist; the repository calls report that as not found.
fn target_id(request: &DefectEditRequest) -> Result<DbId, CoreError> {
    request.operation_defect_id.ok_or_else(|| {
        CoreError::not_found_key(
            ENTITY_OPERATION_DEFECT,
            format!("target of edit request {}", request.id),
        )
    })
}
