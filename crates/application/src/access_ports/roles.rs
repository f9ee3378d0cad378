use std::collections::BTreeSet;

use async_trait::async_trait;
use pagecraft_core::{AppResult, OrgId};
use pagecraft_domain::{CapabilityKey, Role, RoleId, RoleScope};

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in (organization, scope).
    pub name: String,
    /// Administrative description.
    pub description: String,
    /// Org-wide or site-pinned grants.
    pub scope: RoleScope,
    /// Capability keys to attach to the role.
    pub capability_keys: BTreeSet<CapabilityKey>,
}

/// Partial update for a custom role.
///
/// A present `capability_keys` atomically replaces the full set; it is never
/// merged as a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePatch {
    /// Replacement role name.
    pub name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement capability set.
    pub capability_keys: Option<BTreeSet<CapabilityKey>>,
}

/// Repository port for role storage.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists every role owned by the organization.
    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<Role>>;

    /// Finds a role by identifier within the organization.
    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by unique (name, scope) within the organization.
    async fn find_role_by_name(
        &self,
        org_id: OrgId,
        name: &str,
        scope: RoleScope,
    ) -> AppResult<Option<Role>>;

    /// Persists a new role with its capability links.
    async fn insert_role(&self, role: Role) -> AppResult<()>;

    /// Replaces a stored role, including its full capability set.
    async fn update_role(&self, role: Role) -> AppResult<()>;

    /// Deletes a role; capability links cascade.
    async fn delete_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<()>;
}
