use std::sync::Arc;

use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{
    CapabilityKey, CapabilityRegistry, Decision, EffectiveCapability, GrantContext,
    effective_capabilities, evaluate,
};

use crate::access_ports::{AssignmentRepository, PolicyRepository, RoleRepository};

/// Application service answering capability checks.
///
/// Every decision is recomputed from current store state; nothing is cached
/// across requests. Reads are not snapshot-isolated across the gather, which
/// is acceptable for an authorization check re-evaluated on the next
/// request.
#[derive(Clone)]
pub struct AccessService {
    registry: Arc<CapabilityRegistry>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    policies: Arc<dyn PolicyRepository>,
}

impl AccessService {
    /// Creates an access service from its ports.
    #[must_use]
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        policies: Arc<dyn PolicyRepository>,
    ) -> Self {
        Self {
            registry,
            roles,
            assignments,
            policies,
        }
    }

    /// Returns the process-wide capability registry.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Decides one capability for a user in an organization.
    pub async fn evaluate(
        &self,
        user_id: UserId,
        org_id: OrgId,
        capability_key: &CapabilityKey,
        site_id: Option<SiteId>,
    ) -> AppResult<Decision> {
        let context = self.gather(user_id, org_id, site_id).await?;
        Ok(evaluate(&self.registry, &context, capability_key))
    }

    /// Decides every registry entry for a user in an organization.
    ///
    /// Shares one gathered context, so each entry carries exactly the
    /// decision a single-capability call would produce.
    pub async fn effective_capabilities(
        &self,
        user_id: UserId,
        org_id: OrgId,
        site_id: Option<SiteId>,
    ) -> AppResult<Vec<EffectiveCapability>> {
        let context = self.gather(user_id, org_id, site_id).await?;
        Ok(effective_capabilities(&self.registry, &context))
    }

    /// Decides a raw capability string for a user in an organization.
    ///
    /// A string that does not parse as a capability key cannot name a
    /// registry entry, so it yields the unknown-capability denial rather
    /// than a validation error.
    pub async fn evaluate_raw(
        &self,
        user_id: UserId,
        org_id: OrgId,
        capability: &str,
        site_id: Option<SiteId>,
    ) -> AppResult<Decision> {
        match CapabilityKey::new(capability) {
            Ok(key) => self.evaluate(user_id, org_id, &key, site_id).await,
            Err(_) => Ok(Decision::unknown_capability()),
        }
    }

    /// Boolean projection of [`evaluate`](Self::evaluate).
    pub async fn has_capability(
        &self,
        user_id: UserId,
        org_id: OrgId,
        capability_key: &CapabilityKey,
        site_id: Option<SiteId>,
    ) -> AppResult<bool> {
        Ok(self
            .evaluate(user_id, org_id, capability_key, site_id)
            .await?
            .allowed)
    }

    /// Ensures the user holds the capability, failing with the decision's
    /// reason code and the capability key only.
    pub async fn require_capability(
        &self,
        user_id: UserId,
        org_id: OrgId,
        capability_key: &CapabilityKey,
        site_id: Option<SiteId>,
    ) -> AppResult<()> {
        let decision = self
            .evaluate(user_id, org_id, capability_key, site_id)
            .await?;

        if decision.allowed {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "capability '{capability_key}' denied: {}",
            decision.reason.as_str()
        )))
    }

    async fn gather(
        &self,
        user_id: UserId,
        org_id: OrgId,
        site_id: Option<SiteId>,
    ) -> AppResult<GrantContext> {
        let roles = self.roles.list_roles(org_id).await?;
        let assignments = self
            .assignments
            .list_assignments_for_user(org_id, user_id)
            .await?;
        let policies = self.policies.list_policies(org_id).await?;

        Ok(GrantContext::gather(
            &roles,
            &assignments,
            &policies,
            site_id,
        ))
    }
}

#[cfg(test)]
mod tests;
