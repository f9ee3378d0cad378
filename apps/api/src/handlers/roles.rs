use std::collections::BTreeSet;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use pagecraft_application::{CreateRoleInput, RolePatch};
use pagecraft_core::UserIdentity;
use pagecraft_domain::{CapabilityKey, RoleId, RoleScope, TenantContext};
use uuid::Uuid;

use super::{MANAGE_ROLES, capability_key};
use crate::dto::{CreateRoleRequest, DeleteRoleQuery, RoleResponse, UpdateRoleRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    require_role_management(&state, &user, context).await?;

    let roles = state
        .role_service
        .list_roles(context.org_id)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<RoleResponse>> {
    require_role_management(&state, &user, context).await?;

    let role = state
        .role_service
        .get_role(context.org_id, RoleId::from_uuid(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    require_role_management(&state, &user, context).await?;

    let role = state
        .role_service
        .create_role(
            context.org_id,
            user.user_id(),
            CreateRoleInput {
                name: payload.name,
                description: payload.description,
                scope: RoleScope::from_storage(payload.scope.as_str())?,
                capability_keys: parse_capability_set(payload.capabilities)?,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    require_role_management(&state, &user, context).await?;

    let capability_keys = payload
        .capabilities
        .map(parse_capability_set)
        .transpose()?;

    let role = state
        .role_service
        .update_role(
            context.org_id,
            user.user_id(),
            RoleId::from_uuid(role_id),
            RolePatch {
                name: payload.name,
                description: payload.description,
                capability_keys,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Path(role_id): Path<Uuid>,
    Query(query): Query<DeleteRoleQuery>,
) -> ApiResult<StatusCode> {
    require_role_management(&state, &user, context).await?;

    state
        .role_service
        .delete_role(
            context.org_id,
            user.user_id(),
            RoleId::from_uuid(role_id),
            query.force,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn require_role_management(
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

fn parse_capability_set(values: Vec<String>) -> Result<BTreeSet<CapabilityKey>, crate::error::ApiError> {
    values
        .into_iter()
        .map(|value| CapabilityKey::new(value).map_err(crate::error::ApiError::from))
        .collect()
}
