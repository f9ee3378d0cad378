use axum::Json;
use axum::extract::{Extension, State};
use pagecraft_core::UserIdentity;
use pagecraft_domain::{CapabilityKey, TenantContext};

use super::{MANAGE_POLICIES, capability_key};
use crate::dto::{PolicyResponse, UpsertPolicyRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_policies_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
) -> ApiResult<Json<Vec<PolicyResponse>>> {
    require_policy_management(&state, &user, context).await?;

    let policies = state
        .policy_service
        .list_policies(context.org_id)
        .await?
        .into_iter()
        .map(PolicyResponse::from)
        .collect();

    Ok(Json(policies))
}

pub async fn upsert_policy_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Json(payload): Json<UpsertPolicyRequest>,
) -> ApiResult<Json<PolicyResponse>> {
    require_policy_management(&state, &user, context).await?;

    let stored = state
        .policy_service
        .upsert_policy(
            context.org_id,
            user.user_id(),
            CapabilityKey::new(payload.capability_key)?,
            payload.enabled,
        )
        .await?;

    Ok(Json(PolicyResponse::from(stored)))
}

async fn require_policy_management(
    state: &AppState,
    user: &UserIdentity,
    context: TenantContext,
) -> ApiResult<()> {
    let key = capability_key(MANAGE_POLICIES)?;
    state
        .access_service
        .require_capability(user.user_id(), context.org_id, &key, context.site_id)
        .await?;
    Ok(())
}
