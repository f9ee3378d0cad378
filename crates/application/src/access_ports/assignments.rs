use async_trait::async_trait;
use pagecraft_core::{AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{AssignmentId, RoleAssignment, RoleId};

/// Repository port for role assignment storage.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Lists every assignment in the organization.
    async fn list_assignments(&self, org_id: OrgId) -> AppResult<Vec<RoleAssignment>>;

    /// Lists assignments held by one user in the organization.
    async fn list_assignments_for_user(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Finds an assignment by identifier within the organization.
    async fn find_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Finds an existing assignment for the exact (user, role, site) tuple.
    async fn find_assignment_for_grant(
        &self,
        org_id: OrgId,
        user_id: UserId,
        role_id: RoleId,
        site_id: Option<SiteId>,
    ) -> AppResult<Option<RoleAssignment>>;

    /// Persists a new assignment.
    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()>;

    /// Deletes one assignment.
    async fn delete_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<()>;

    /// Counts assignments referencing a role.
    async fn count_assignments_for_role(&self, org_id: OrgId, role_id: RoleId)
    -> AppResult<u64>;

    /// Deletes every assignment referencing a role, returning the count removed.
    async fn delete_assignments_for_role(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64>;
}
