use axum::Json;
use axum::extract::{Extension, State};
use pagecraft_core::UserIdentity;
use pagecraft_domain::{Capability, TenantContext};

use crate::dto::{CheckCapabilityRequest, DecisionResponse, EffectiveCapabilityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Returns the full capability catalog.
pub async fn list_capabilities_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Capability>>> {
    Ok(Json(state.access_service.registry().all().to_vec()))
}

/// Decides every registered capability for the calling user.
pub async fn effective_capabilities_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
) -> ApiResult<Json<Vec<EffectiveCapabilityResponse>>> {
    let entries = state
        .access_service
        .effective_capabilities(user.user_id(), context.org_id, context.site_id)
        .await?
        .into_iter()
        .map(EffectiveCapabilityResponse::from)
        .collect();

    Ok(Json(entries))
}

/// Decides one capability for the calling user.
///
/// A string that is not a well-formed capability key is answered with the
/// unknown-capability denial, the same as any other unregistered key.
pub async fn check_capability_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(context): Extension<TenantContext>,
    Json(payload): Json<CheckCapabilityRequest>,
) -> ApiResult<Json<DecisionResponse>> {
    let decision = state
        .access_service
        .evaluate_raw(
            user.user_id(),
            context.org_id,
            &payload.capability,
            context.site_id,
        )
        .await?;

    Ok(Json(DecisionResponse {
        capability: payload.capability,
        decision,
    }))
}
