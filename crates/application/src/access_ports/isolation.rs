use async_trait::async_trait;
use pagecraft_core::AppResult;
use pagecraft_domain::TenantContext;

/// Handle over the tenant isolation scope for one request.
///
/// [`release`](ScopeGuard::release) clears the scope. A release failure is
/// fatal for the request it guards. Implementations must treat a guard
/// dropped without release as a discarded scope, never a cleanly closed one.
#[async_trait]
pub trait ScopeGuard: Send {
    /// Clears the isolation scope.
    async fn release(self: Box<Self>) -> AppResult<()>;
}

/// Port for binding a tenant context around a request's data access.
///
/// Repository queries carry the organization as an explicit predicate; the
/// scope tracks which context a request operates under from enter to
/// release. A request that cannot enter its scope must fail closed rather
/// than proceed unscoped.
#[async_trait]
pub trait IsolationScope: Send + Sync {
    /// Records the context and returns the guard that owns the scope.
    async fn enter(&self, context: TenantContext) -> AppResult<Box<dyn ScopeGuard>>;
}
