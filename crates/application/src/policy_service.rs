use std::sync::Arc;

use pagecraft_core::{AppError, AppResult, OrgId, UserId};
use pagecraft_domain::{
    AuditAction, CapabilityKey, CapabilityRegistry, OrgPolicy, PolicyId,
};

use crate::access_ports::{AuditEvent, AuditRepository, PolicyRepository};

/// Application service for organization capability policies.
#[derive(Clone)]
pub struct PolicyService {
    registry: Arc<CapabilityRegistry>,
    policies: Arc<dyn PolicyRepository>,
    audit: Arc<dyn AuditRepository>,
}

impl PolicyService {
    /// Creates a policy service from its ports.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        policies: Arc<dyn PolicyRepository>,
        audit: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            registry,
            policies,
            audit,
        }
    }

    /// Lists every explicit policy row for the organization.
    pub async fn list_policies(&self, org_id: OrgId) -> AppResult<Vec<OrgPolicy>> {
        self.policies.list_policies(org_id).await
    }

    /// Inserts or updates the policy row for one capability.
    pub async fn upsert_policy(
        &self,
        org_id: OrgId,
        actor: UserId,
        capability_key: CapabilityKey,
        enabled: bool,
    ) -> AppResult<OrgPolicy> {
        let capability = self.registry.lookup(&capability_key).ok_or_else(|| {
            AppError::NotFound(format!(
                "capability '{capability_key}' is not registered"
            ))
        })?;

        if !capability.can_be_policy_controlled {
            return Err(AppError::Validation(format!(
                "capability '{capability_key}' is not policy-controllable"
            )));
        }

        let stored = self
            .policies
            .upsert_policy(OrgPolicy {
                id: PolicyId::new(),
                org_id,
                capability_key: capability_key.clone(),
                enabled,
                created_by: actor,
            })
            .await?;

        self.audit
            .append_event(AuditEvent {
                org_id,
                actor,
                action: AuditAction::PolicyUpserted,
                resource_type: "access_org_policy".to_owned(),
                resource_id: capability_key.as_str().to_owned(),
                detail: Some(format!(
                    "set capability '{capability_key}' policy to enabled={enabled}"
                )),
            })
            .await?;

        Ok(stored)
    }
}
