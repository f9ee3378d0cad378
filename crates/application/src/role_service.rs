use std::collections::BTreeSet;
use std::sync::Arc;

use pagecraft_core::{AppError, AppResult, NonEmptyString, OrgId, UserId};
use pagecraft_domain::{
    AuditAction, CapabilityKey, CapabilityRegistry, Role, RoleId, RoleScope, RoleType,
    validate_custom_role_capabilities,
};

use crate::access_ports::{
    AssignmentRepository, AuditEvent, AuditRepository, CreateRoleInput, RolePatch, RoleRepository,
};

/// Application service for role management.
///
/// System roles pass through untouched: every mutating operation rejects
/// them before reaching the repository.
#[derive(Clone)]
pub struct RoleService {
    registry: Arc<CapabilityRegistry>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl RoleService {
    /// Creates a role service from its ports.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            registry,
            roles,
            assignments,
            audit,
        }
    }

    /// Lists every role owned by the organization.
    pub async fn list_roles(&self, org_id: OrgId) -> AppResult<Vec<Role>> {
        self.roles.list_roles(org_id).await
    }

    /// Returns one role, failing if it does not belong to the organization.
    pub async fn get_role(&self, org_id: OrgId, role_id: RoleId) -> AppResult<Role> {
        self.roles
            .find_role(org_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Creates a custom, mutable role.
    pub async fn create_role(
        &self,
        org_id: OrgId,
        actor: UserId,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let name = NonEmptyString::new(input.name)?;
        validate_custom_role_capabilities(&self.registry, &input.capability_keys)?;

        if self
            .roles
            .find_role_by_name(org_id, name.as_str(), input.scope)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a {} role named '{}' already exists",
                input.scope.as_str(),
                name.as_str()
            )));
        }

        let role = Role {
            id: RoleId::new(),
            org_id,
            name: name.as_str().to_owned(),
            description: input.description,
            role_type: RoleType::Custom,
            scope: input.scope,
            is_immutable: false,
            capabilities: input.capability_keys,
        };
        self.roles.insert_role(role.clone()).await?;

        self.append_role_event(
            org_id,
            actor,
            AuditAction::RoleCreated,
            &role,
            format!("created role '{}'", role.name),
        )
        .await?;

        Ok(role)
    }

    /// Updates a custom role; a present capability set replaces the old one.
    pub async fn update_role(
        &self,
        org_id: OrgId,
        actor: UserId,
        role_id: RoleId,
        patch: RolePatch,
    ) -> AppResult<Role> {
        let mut role = self.get_role(org_id, role_id).await?;
        self.reject_unmanaged(&role, "updated")?;

        if let Some(name) = patch.name {
            let name = NonEmptyString::new(name)?;
            if name.as_str() != role.name {
                if self
                    .roles
                    .find_role_by_name(org_id, name.as_str(), role.scope)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(format!(
                        "a {} role named '{}' already exists",
                        role.scope.as_str(),
                        name.as_str()
                    )));
                }
                role.name = name.as_str().to_owned();
            }
        }

        if let Some(description) = patch.description {
            role.description = description;
        }

        if let Some(capability_keys) = patch.capability_keys {
            validate_custom_role_capabilities(&self.registry, &capability_keys)?;
            role.capabilities = capability_keys;
        }

        self.roles.update_role(role.clone()).await?;

        self.append_role_event(
            org_id,
            actor,
            AuditAction::RoleUpdated,
            &role,
            format!("updated role '{}'", role.name),
        )
        .await?;

        Ok(role)
    }

    /// Deletes a custom role.
    ///
    /// With `force`, existing assignments are removed first; without it,
    /// existing assignments block deletion with their count.
    pub async fn delete_role(
        &self,
        org_id: OrgId,
        actor: UserId,
        role_id: RoleId,
        force: bool,
    ) -> AppResult<()> {
        let role = self.get_role(org_id, role_id).await?;
        self.reject_unmanaged(&role, "deleted")?;

        let assignment_count = self
            .assignments
            .count_assignments_for_role(org_id, role_id)
            .await?;

        if assignment_count > 0 && !force {
            return Err(AppError::Conflict(format!(
                "role '{}' has {assignment_count} active assignment(s); pass force to delete them",
                role.name
            )));
        }

        if assignment_count > 0 {
            self.assignments
                .delete_assignments_for_role(org_id, role_id)
                .await?;
        }
        self.roles.delete_role(org_id, role_id).await?;

        self.append_role_event(
            org_id,
            actor,
            AuditAction::RoleDeleted,
            &role,
            format!(
                "deleted role '{}' ({assignment_count} assignment(s) removed)",
                role.name
            ),
        )
        .await
    }

    /// Seeds the immutable system roles for an organization, once.
    pub async fn ensure_system_roles(&self, org_id: OrgId) -> AppResult<()> {
        for (name, scope, capability_keys) in self.system_role_catalog() {
            if self
                .roles
                .find_role_by_name(org_id, name, scope)
                .await?
                .is_some()
            {
                continue;
            }

            self.roles
                .insert_role(Role {
                    id: RoleId::new(),
                    org_id,
                    name: name.to_owned(),
                    description: format!("System role '{name}'"),
                    role_type: RoleType::System,
                    scope,
                    is_immutable: true,
                    capabilities: capability_keys,
                })
                .await?;
        }

        Ok(())
    }

    fn system_role_catalog(&self) -> Vec<(&'static str, RoleScope, BTreeSet<CapabilityKey>)> {
        let all_keys: BTreeSet<CapabilityKey> = self
            .registry
            .all()
            .iter()
            .map(|capability| capability.key.clone())
            .collect();
        let editor_keys: BTreeSet<CapabilityKey> = self
            .registry
            .all()
            .iter()
            .filter(|capability| {
                matches!(
                    capability.key.module(),
                    "builder" | "content" | "collections"
                )
            })
            .map(|capability| capability.key.clone())
            .collect();
        let viewer_keys: BTreeSet<CapabilityKey> = self
            .registry
            .all()
            .iter()
            .filter(|capability| capability.key.as_str() == "content.read")
            .map(|capability| capability.key.clone())
            .collect();

        vec![
            ("Org Admin", RoleScope::Org, all_keys),
            ("Site Editor", RoleScope::Site, editor_keys),
            ("Viewer", RoleScope::Org, viewer_keys),
        ]
    }

    fn reject_unmanaged(&self, role: &Role, operation: &str) -> AppResult<()> {
        if role.is_managed() {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "system role '{}' cannot be {operation}",
            role.name
        )))
    }

    async fn append_role_event(
        &self,
        org_id: OrgId,
        actor: UserId,
        action: AuditAction,
        role: &Role,
        detail: String,
    ) -> AppResult<()> {
        self.audit
            .append_event(AuditEvent {
                org_id,
                actor,
                action,
                resource_type: "access_role".to_owned(),
                resource_id: role.id.to_string(),
                detail: Some(detail),
            })
            .await
    }
}
