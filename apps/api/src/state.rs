use std::sync::Arc;

use pagecraft_application::{
    AccessService, AssignmentService, ContextResolver, IsolationScope, PolicyService, RoleService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessService,
    pub role_service: RoleService,
    pub assignment_service: AssignmentService,
    pub policy_service: PolicyService,
    pub context_resolver: ContextResolver,
    pub isolation: Arc<dyn IsolationScope>,
}
