use std::sync::Arc;

use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{
    AssignmentId, AuditAction, RoleAssignment, RoleId, validate_site_binding,
};

use crate::access_ports::{
    AssignmentRepository, AuditEvent, AuditRepository, DirectoryRepository, RoleRepository,
};

/// Application service for role assignment management.
#[derive(Clone)]
pub struct AssignmentService {
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    directory: Arc<dyn DirectoryRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl AssignmentService {
    /// Creates an assignment service from its ports.
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        directory: Arc<dyn DirectoryRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            roles,
            assignments,
            directory,
            audit,
        }
    }

    /// Lists every assignment in the organization.
    pub async fn list_assignments(&self, org_id: OrgId) -> AppResult<Vec<RoleAssignment>> {
        self.assignments.list_assignments(org_id).await
    }

    /// Grants a role to a user, optionally pinned to one site.
    pub async fn create_assignment(
        &self,
        org_id: OrgId,
        actor: UserId,
        user_id: UserId,
        role_id: RoleId,
        site_id: Option<SiteId>,
    ) -> AppResult<RoleAssignment> {
        let role = self
            .roles
            .find_role(org_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if !self.directory.is_member(org_id, user_id).await? {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not belong to organization '{org_id}'"
            )));
        }

        validate_site_binding(role.scope, site_id)?;

        if let Some(site_id) = site_id {
            let site = self
                .directory
                .find_site(site_id)
                .await?
                .filter(|site| site.org_id == org_id);
            if site.is_none() {
                return Err(AppError::NotFound(format!(
                    "site '{site_id}' was not found in organization '{org_id}'"
                )));
            }
        }

        if self
            .assignments
            .find_assignment_for_grant(org_id, user_id, role_id, site_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' already holds role '{}' for this scope",
                role.name
            )));
        }

        let assignment = RoleAssignment {
            id: AssignmentId::new(),
            org_id,
            user_id,
            role_id,
            site_id,
        };
        self.assignments
            .insert_assignment(assignment.clone())
            .await?;

        self.audit
            .append_event(AuditEvent {
                org_id,
                actor,
                action: AuditAction::AssignmentCreated,
                resource_type: "access_assignment".to_owned(),
                resource_id: assignment.id.to_string(),
                detail: Some(format!(
                    "assigned role '{}' to user '{user_id}'",
                    role.name
                )),
            })
            .await?;

        Ok(assignment)
    }

    /// Removes one assignment.
    pub async fn delete_assignment(
        &self,
        org_id: OrgId,
        actor: UserId,
        assignment_id: AssignmentId,
    ) -> AppResult<()> {
        let assignment = self
            .assignments
            .find_assignment(org_id, assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{assignment_id}' was not found"))
            })?;

        self.assignments
            .delete_assignment(org_id, assignment_id)
            .await?;

        self.audit
            .append_event(AuditEvent {
                org_id,
                actor,
                action: AuditAction::AssignmentDeleted,
                resource_type: "access_assignment".to_owned(),
                resource_id: assignment.id.to_string(),
                detail: Some(format!(
                    "removed role assignment from user '{}'",
                    assignment.user_id
                )),
            })
            .await
    }
}
