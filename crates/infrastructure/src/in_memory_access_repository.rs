use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagecraft_application::{
    AssignmentRepository, AuditEvent, AuditRepository, DirectoryRepository, OrgRecord,
    PolicyRepository, RoleRepository, SiteRecord,
};
use pagecraft_core::{AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{AssignmentId, OrgPolicy, Role, RoleAssignment, RoleId, RoleScope};
use tokio::sync::RwLock;

/// In-memory implementation of every access store port.
///
/// Used by local development and tests; the maps mirror the Postgres tables.
#[derive(Debug, Default)]
pub struct InMemoryAccessRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
    assignments: RwLock<HashMap<AssignmentId, RoleAssignment>>,
    policies: RwLock<HashMap<(OrgId, String), OrgPolicy>>,
    orgs: RwLock<HashMap<OrgId, OrgRecord>>,
    sites: RwLock<HashMap<SiteId, SiteRecord>>,
    memberships: RwLock<HashSet<(OrgId, UserId)>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAccessRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an organization in the directory.
    pub async fn put_org(&self, org: OrgRecord) {
        self.orgs.write().await.insert(org.id, org);
    }

    /// Registers a site in the directory.
    pub async fn put_site(&self, site: SiteRecord) {
        self.sites.write().await.insert(site.id, site);
    }

    /// Registers an organization membership.
    pub async fn put_membership(&self, org_id: OrgId, user_id: UserId) {
        self.memberships.write().await.insert((org_id, user_id));
    }

    /// Returns the audit events appended so far.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessRepository {
    async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;
        let mut listed: Vec<Role> = roles
            .values()
            .filter(|role| role.org_id == org_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(listed)
    }

    async fn find_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .get(&role_id)
            .filter(|role| role.org_id == org_id)
            .cloned())
    }

    async fn find_role_by_name(
        &self,
        org_id: OrgId,
        name: &str,
        scope: RoleScope,
    ) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.org_id == org_id && role.name == name && role.scope == scope)
            .cloned())
    }

    async fn insert_role(&self, role: Role) -> AppResult<()> {
        self.roles.write().await.insert(role.id, role);
        Ok(())
    }

    async fn update_role(&self, role: Role) -> AppResult<()> {
        self.roles.write().await.insert(role.id, role);
        Ok(())
    }

    async fn delete_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        if roles
            .get(&role_id)
            .is_some_and(|role| role.org_id == org_id)
        {
            roles.remove(&role_id);
        }
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAccessRepository {
    async fn list_assignments(&self, org_id: OrgId) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;
        let mut listed: Vec<RoleAssignment> = assignments
            .values()
            .filter(|assignment| assignment.org_id == org_id)
            .cloned()
            .collect();
        listed.sort_by_key(|assignment| assignment.id.as_uuid());
        Ok(listed)
    }

    async fn list_assignments_for_user(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.org_id == org_id && assignment.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(&assignment_id)
            .filter(|assignment| assignment.org_id == org_id)
            .cloned())
    }

    async fn find_assignment_for_grant(
        &self,
        org_id: OrgId,
        user_id: UserId,
        role_id: RoleId,
        site_id: Option<SiteId>,
    ) -> AppResult<Option<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .find(|assignment| {
                assignment.org_id == org_id
                    && assignment.user_id == user_id
                    && assignment.role_id == role_id
                    && assignment.site_id == site_id
            })
            .cloned())
    }

    async fn insert_assignment(&self, assignment: RoleAssignment) -> AppResult<()> {
        self.assignments
            .write()
            .await
            .insert(assignment.id, assignment);
        Ok(())
    }

    async fn delete_assignment(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        if assignments
            .get(&assignment_id)
            .is_some_and(|assignment| assignment.org_id == org_id)
        {
            assignments.remove(&assignment_id);
        }
        Ok(())
    }

    async fn count_assignments_for_role(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.org_id == org_id && assignment.role_id == role_id)
            .count() as u64)
    }

    async fn delete_assignments_for_role(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let mut assignments = self.assignments.write().await;
        let doomed: Vec<AssignmentId> = assignments
            .values()
            .filter(|assignment| assignment.org_id == org_id && assignment.role_id == role_id)
            .map(|assignment| assignment.id)
            .collect();
        let removed = doomed.len() as u64;
        for id in doomed {
            assignments.remove(&id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl PolicyRepository for InMemoryAccessRepository {
    async fn list_policies(&self, org_id: OrgId) -> AppResult<Vec<OrgPolicy>> {
        let mut listed: Vec<OrgPolicy> = self
            .policies
            .read()
            .await
            .values()
            .filter(|policy| policy.org_id == org_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.capability_key.cmp(&right.capability_key));
        Ok(listed)
    }

    async fn upsert_policy(&self, policy: OrgPolicy) -> AppResult<OrgPolicy> {
        let key = (policy.org_id, policy.capability_key.as_str().to_owned());
        let mut policies = self.policies.write().await;

        let stored = match policies.get(&key) {
            Some(existing) => OrgPolicy {
                id: existing.id,
                enabled: policy.enabled,
                created_by: policy.created_by,
                ..policy
            },
            None => policy,
        };

        policies.insert(key, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryAccessRepository {
    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<OrgRecord>> {
        Ok(self.orgs.read().await.get(&org_id).cloned())
    }

    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<SiteRecord>> {
        Ok(self.sites.read().await.get(&site_id).cloned())
    }

    async fn is_member(&self, org_id: OrgId, user_id: UserId) -> AppResult<bool> {
        Ok(self.memberships.read().await.contains(&(org_id, user_id)))
    }
}

#[async_trait]
impl AuditRepository for InMemoryAccessRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
