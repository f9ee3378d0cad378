//! Ports consumed by the access services.

mod assignments;
mod audit;
mod directory;
mod isolation;
mod policies;
mod roles;

pub use assignments::AssignmentRepository;
pub use audit::{AuditEvent, AuditRepository};
pub use directory::{DirectoryRepository, OrgRecord, SiteRecord};
pub use isolation::{IsolationScope, ScopeGuard};
pub use policies::PolicyRepository;
pub use roles::{CreateRoleInput, RolePatch, RoleRepository};
