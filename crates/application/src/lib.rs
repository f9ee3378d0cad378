//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod access_service;
mod assignment_service;
mod context_resolver;
mod policy_service;
mod role_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    AssignmentRepository, AuditEvent, AuditRepository, CreateRoleInput, DirectoryRepository,
    IsolationScope, OrgRecord, PolicyRepository, RolePatch, RoleRepository, ScopeGuard,
    SiteRecord,
};
pub use access_service::AccessService;
pub use assignment_service::AssignmentService;
pub use context_resolver::{ContextResolver, RequestIdentifiers};
pub use policy_service::PolicyService;
pub use role_service::RoleService;
