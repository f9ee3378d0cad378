use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pagecraft_core::{SiteId, UserId, UserIdentity};
use pagecraft_domain::{AssignmentId, RoleId, TenantContext};
use uuid::Uuid;

use super::{MANAGE_ROLES, capability_key};
use crate::dto::{AssignmentResponse, CreateAssignmentRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    require_assignment_management(&state, &user, context).await?;

    let assignments = state
        .assignment_service
        .list_assignments(context.org_id)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    require_assignment_management(&state, &user, context).await?;

    let assignment = state
        .assignment_service
        .create_assignment(
            context.org_id,
            user.user_id(),
            UserId::from_uuid(payload.user_id),
            RoleId::from_uuid(payload.role_id),
            payload.site_id.map(SiteId::from_uuid),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::from(assignment)),
    ))
}

pub async fn delete_assignment_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Path(assignment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_assignment_management(&state, &user, context).await?;

    state
        .assignment_service
        .delete_assignment(
            context.org_id,
            user.user_id(),
            AssignmentId::from_uuid(assignment_id),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn require_assignment_management(
    state: &AppState,
    user: &UserIdentity,
    context: TenantContext,
) -> ApiResult<()> {
    let key = capability_key(MANAGE_ROLES)?;
    state
        .access_service
        .require_capability(user.user_id(), context.org_id, &key, context.site_id)
        .await?;
    Ok(())
}
