use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pagecraft_application::{AssignmentRepository, PolicyRepository, RoleRepository};
use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{
    AssignmentId, CapabilityKey, OrgPolicy, PolicyId, Role, RoleAssignment, RoleId, RoleScope,
    RoleType,
};

mod assignments;
mod policies;
mod roles;

/// PostgreSQL-backed store for roles, assignments and policies.
///
/// Every query binds the organization identifier explicitly; tenant
/// isolation never depends on connection-level session state.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: uuid::Uuid,
    org_id: uuid::Uuid,
    role_name: String,
    description: String,
    role_type: String,
    scope: String,
    is_immutable: bool,
    capability_key: Option<String>,
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    assignment_id: uuid::Uuid,
    org_id: uuid::Uuid,
    user_id: uuid::Uuid,
    role_id: uuid::Uuid,
    site_id: Option<uuid::Uuid>,
}

#[derive(Debug, FromRow)]
struct PolicyRow {
    policy_id: uuid::Uuid,
    org_id: uuid::Uuid,
    capability_key: String,
    enabled: bool,
    created_by: uuid::Uuid,
}

#[async_trait]
impl RoleRepository for PostgresAccessRepository {
    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<Role>> {
        self.list_roles_impl(org_id).await
    }

    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(org_id, role_id).await
    }

    async fn find_role_by_name(
        &self,
        org_id: OrgId,
        name: &str,
        scope: RoleScope,
    ) -> AppResult<Option<Role>> {
        self.find_role_by_name_impl(org_id, name, scope).await
    }

    async fn insert_role(&self, role: Role) -> AppResult<()> {
        self.insert_role_impl(role).await
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        self.update_role_impl(role).await
    }

    async fn delete_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<()> {
        self.delete_role_impl(org_id, role_id).await
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAccessRepository {
    async fn list_assignments(&self, org_id: OrgId) -> AppResult<Vec<RoleAssignment>> {
        self.list_assignments_impl(org_id).await
    }

    async fn list_assignments_for_user(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.list_assignments_for_user_impl(org_id, user_id).await
    }

    async fn find_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        self.find_assignment_impl(org_id, assignment_id).await
    }

    async fn find_assignment_for_grant(
        &self,
        org_id: OrgId,
        user_id: UserId,
        role_id: RoleId,
        site_id: Option<SiteId>,
    ) -> AppResult<Option<RoleAssignment>> {
        self.find_assignment_for_grant_impl(org_id, user_id, role_id, site_id)
            .await
    }

    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.insert_assignment_impl(assignment).await
    }

    async fn delete_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<()> {
        self.delete_assignment_impl(org_id, assignment_id).await
    }

    async fn count_assignments_for_role(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        self.count_assignments_for_role_impl(org_id, role_id).await
    }

    async fn delete_assignments_for_role(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        self.delete_assignments_for_role_impl(org_id, role_id).await
    }
}

#[async_trait]
impl PolicyRepository for PostgresAccessRepository {
    async fn list_policies(&self, org_id: OrgId) -> AppResult<Vec<OrgPolicy>> {
        self.list_policies_impl(org_id).await
    }

    async fn upsert_policy(&self, policy: OrgPolicy) -> AppResult<OrgPolicy> {
        self.upsert_policy_impl(policy).await
    }
}

fn aggregate_roles(rows: Vec<RoleRow>) -> AppResult<Vec<Role>> {
    let mut by_id: HashMap<uuid::Uuid, Role> = HashMap::new();

    for row in rows {
        if !by_id.contains_key(&row.role_id) {
            let role = Role {
                id: RoleId::from_uuid(row.role_id),
                org_id: OrgId::from_uuid(row.org_id),
                name: row.role_name.clone(),
                description: row.description.clone(),
                role_type: RoleType::from_storage(row.role_type.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored role type for role '{}': {error}",
                        row.role_id
                    ))
                })?,
                scope: RoleScope::from_storage(row.scope.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored role scope for role '{}': {error}",
                        row.role_id
                    ))
                })?,
                is_immutable: row.is_immutable,
                capabilities: BTreeSet::new(),
            };
            by_id.insert(row.role_id, role);
        }

        if let Some(capability_value) = row.capability_key {
            let key = CapabilityKey::new(capability_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored capability key '{capability_value}': {error}"
                ))
            })?;
            if let Some(role) = by_id.get_mut(&row.role_id) {
                role.capabilities.insert(key);
            }
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}

fn assignment_from_row(row: AssignmentRow) -> RoleAssignment {
    RoleAssignment {
        id: AssignmentId::from_uuid(row.assignment_id),
        org_id: OrgId::from_uuid(row.org_id),
        user_id: UserId::from_uuid(row.user_id),
        role_id: RoleId::from_uuid(row.role_id),
        site_id: row.site_id.map(SiteId::from_uuid),
    }
}

fn policy_from_row(row: PolicyRow) -> AppResult<OrgPolicy> {
    let capability_key = CapabilityKey::new(row.capability_key.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "invalid stored capability key '{}': {error}",
            row.capability_key
        ))
    })?;

    Ok(OrgPolicy {
        id: PolicyId::from_uuid(row.policy_id),
        org_id: OrgId::from_uuid(row.org_id),
        capability_key,
        enabled: row.enabled,
        created_by: UserId::from_uuid(row.created_by),
    })
}

fn map_unique_violation(error: sqlx::Error, conflict: AppError) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return conflict;
    }

    AppError::Internal(format!("database write failed: {error}"))
}
