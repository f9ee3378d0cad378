use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use pagecraft_application::{RequestIdentifiers, ScopeGuard};
use pagecraft_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::error::ApiResult;
use crate::state::AppState;

/// Session key under which the authenticated identity is stored.
pub const SESSION_USER_KEY: &str = "pagecraft.user";

/// Header carrying an explicit organization identifier.
pub const ORG_HEADER: &str = "x-pagecraft-org";

/// Header carrying an explicit site identifier.
pub const SITE_HEADER: &str = "x-pagecraft-site";

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Resolves the tenant context for the request and pins the persistence
/// isolation scope around the downstream handler.
///
/// The scope guard is held across the handler call and released afterwards.
/// A release failure is fatal for the request: the handler's response is
/// discarded and an internal error is returned instead.
pub async fn resolve_tenant(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let headers = request.headers();
    let identifiers = RequestIdentifiers {
        header_org: header_value(headers, ORG_HEADER),
        query_org: query.get("org_id").cloned(),
        header_site: header_value(headers, SITE_HEADER),
        query_site: query.get("site_id").cloned(),
    };

    let identity = request.extensions().get::<UserIdentity>().cloned();

    let resolution = state
        .context_resolver
        .resolve(&identifiers, identity.as_ref())
        .await?;

    let Some(context) = resolution.context() else {
        return Err(AppError::Validation(
            "an organization context is required for this route".to_owned(),
        )
        .into());
    };

    let guard = state.isolation.enter(context).await?;
    request.extensions_mut().insert(context);

    let response = next.run(request).await;

    close_scope(guard, response).await
}

/// Releases the tenant scope and hands the response through.
///
/// The request must never complete while its scope is still pinned, so a
/// release error replaces the response.
async fn close_scope(guard: Box<dyn ScopeGuard>, response: Response) -> ApiResult<Response> {
    guard.release().await?;
    Ok(response)
}

fn header_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use pagecraft_application::{IsolationScope, ScopeGuard};
    use pagecraft_core::{AppError, AppResult, OrgId};
    use pagecraft_domain::TenantContext;
    use pagecraft_infrastructure::TenantScopeRegistry;

    use super::close_scope;

    struct StuckGuard;

    #[async_trait]
    impl ScopeGuard for StuckGuard {
        async fn release(self: Box<Self>) -> AppResult<()> {
            Err(AppError::Internal("scope reset failed".to_owned()))
        }
    }

    #[tokio::test]
    async fn failed_scope_release_fails_the_request() {
        let result = close_scope(Box::new(StuckGuard), Response::new(Body::empty())).await;

        match result {
            Err(error) => {
                assert_eq!(
                    error.into_response().status(),
                    StatusCode::INTERNAL_SERVER_ERROR
                );
            }
            Ok(_) => panic!("a failed release must not return the response"),
        }
    }

    #[tokio::test]
    async fn released_scope_passes_the_response_through() {
        let scope = TenantScopeRegistry::new();
        let guard = match scope.enter(TenantContext::for_org(OrgId::new())).await {
            Ok(guard) => guard,
            Err(error) => panic!("enter must succeed: {error}"),
        };

        let result = close_scope(guard, StatusCode::CREATED.into_response()).await;

        match result {
            Ok(response) => assert_eq!(response.status(), StatusCode::CREATED),
            Err(error) => panic!("an orderly release must keep the response: {error:?}"),
        }
        assert!(
            scope
                .ledger()
                .is_ok_and(|ledger| ledger.active.is_empty() && ledger.released == 1)
        );
    }
}
