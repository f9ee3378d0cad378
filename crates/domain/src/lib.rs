//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod capability;
mod context;
mod decision;
mod evaluator;
mod policy;
mod role;

pub use assignment::{AssignmentId, RoleAssignment, validate_site_binding};
pub use audit::AuditAction;
pub use capability::{Capability, CapabilityKey, CapabilityRegistry, RiskLevel};
pub use context::{ContextResolution, TenantContext};
pub use decision::{Decision, DecisionReason};
pub use evaluator::{EffectiveCapability, GrantContext, evaluate, effective_capabilities};
pub use policy::{OrgPolicy, PolicyId};
pub use role::{Role, RoleId, RoleScope, RoleType, validate_custom_role_capabilities};
