//! Pure capability decision function.
//!
//! The stores are read once into a [`GrantContext`]; [`evaluate`] and
//! [`effective_capabilities`] then decide from that snapshot alone. Bulk and
//! single-capability evaluation share the context, so they agree by
//! construction.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pagecraft_core::SiteId;

use crate::assignment::RoleAssignment;
use crate::capability::{CapabilityKey, CapabilityRegistry};
use crate::decision::{Decision, DecisionReason};
use crate::policy::OrgPolicy;
use crate::role::{Role, RoleScope};

/// Per-evaluation snapshot of applicable grants and policy overrides.
#[derive(Debug, Clone, Default)]
pub struct GrantContext {
    role_sources: BTreeMap<CapabilityKey, BTreeSet<String>>,
    policies: HashMap<CapabilityKey, bool>,
}

impl GrantContext {
    /// Gathers the applicable grants for one (user, organization, site) query.
    ///
    /// `roles` and `assignments` must already be filtered to the organization
    /// and user under evaluation; `policies` to the organization. An
    /// org-scoped role always applies; a site-scoped role applies only when
    /// `site_id` is given and matches the assignment's pinned site. With no
    /// `site_id`, site-scoped assignments grant nothing.
    #[must_use]
    pub fn gather(
        roles: &[Role],
        assignments: &[RoleAssignment],
        policies: &[OrgPolicy],
        site_id: Option<SiteId>,
    ) -> Self {
        let roles_by_id: HashMap<_, _> = roles.iter().map(|role| (role.id, role)).collect();

        let mut role_sources: BTreeMap<CapabilityKey, BTreeSet<String>> = BTreeMap::new();
        for assignment in assignments {
            let Some(role) = roles_by_id.get(&assignment.role_id) else {
                continue;
            };

            let applicable = match role.scope {
                RoleScope::Org => true,
                RoleScope::Site => {
                    site_id.is_some() && assignment.site_id == site_id
                }
            };
            if !applicable {
                continue;
            }

            for key in &role.capabilities {
                role_sources
                    .entry(key.clone())
                    .or_default()
                    .insert(role.name.clone());
            }
        }

        let policy_map = policies
            .iter()
            .map(|policy| (policy.capability_key.clone(), policy.enabled))
            .collect();

        Self {
            role_sources,
            policies: policy_map,
        }
    }

    /// Returns the sorted role names granting the key in this context.
    fn sources_for(&self, key: &CapabilityKey) -> Vec<String> {
        self.role_sources
            .get(key)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Resolves the policy value for a key, falling back to the registry default.
    fn policy_for(&self, registry: &CapabilityRegistry, key: &CapabilityKey) -> bool {
        self.policies.get(key).copied().unwrap_or_else(|| {
            registry
                .lookup(key)
                .is_some_and(|capability| capability.default_policy_enabled)
        })
    }
}

/// Decides one capability against a gathered context.
///
/// Precedence: unknown capability, then missing role grant, then policy
/// block, then allowed.
#[must_use]
pub fn evaluate(
    registry: &CapabilityRegistry,
    context: &GrantContext,
    key: &CapabilityKey,
) -> Decision {
    let role_sources = context.sources_for(key);
    let policy_enabled = context.policy_for(registry, key);

    let reason = if registry.lookup(key).is_none() {
        DecisionReason::UnknownCapability
    } else if role_sources.is_empty() {
        DecisionReason::MissingRoleCapability
    } else if !policy_enabled {
        DecisionReason::BlockedByPolicy
    } else {
        DecisionReason::Allowed
    };

    Decision {
        allowed: reason == DecisionReason::Allowed,
        reason,
        policy_enabled,
        role_sources,
    }
}

/// One registry entry paired with its decision for the current context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveCapability {
    /// Registered capability key.
    pub key: CapabilityKey,
    /// Decision a single-capability evaluation would produce.
    pub decision: Decision,
}

/// Decides every registry entry against one gathered context.
///
/// Order follows the registry's stable catalog order.
#[must_use]
pub fn effective_capabilities(
    registry: &CapabilityRegistry,
    context: &GrantContext,
) -> Vec<EffectiveCapability> {
    registry
        .all()
        .iter()
        .map(|capability| EffectiveCapability {
            key: capability.key.clone(),
            decision: evaluate(registry, context, &capability.key),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pagecraft_core::{OrgId, SiteId, UserId};

    use super::{GrantContext, effective_capabilities, evaluate};
    use crate::assignment::{AssignmentId, RoleAssignment};
    use crate::capability::{CapabilityKey, CapabilityRegistry};
    use crate::decision::DecisionReason;
    use crate::policy::{OrgPolicy, PolicyId};
    use crate::role::{Role, RoleId, RoleScope, RoleType};

    fn registry() -> CapabilityRegistry {
        match CapabilityRegistry::builtin() {
            Ok(registry) => registry,
            Err(error) => panic!("builtin registry must construct: {error}"),
        }
    }

    fn key(value: &str) -> CapabilityKey {
        match CapabilityKey::new(value) {
            Ok(key) => key,
            Err(error) => panic!("test key must be valid: {error}"),
        }
    }

    fn role(
        org_id: OrgId,
        name: &str,
        scope: RoleScope,
        capability_keys: &[&str],
    ) -> Role {
        Role {
            id: RoleId::new(),
            org_id,
            name: name.to_owned(),
            description: String::new(),
            role_type: RoleType::Custom,
            scope,
            is_immutable: false,
            capabilities: capability_keys.iter().map(|value| key(value)).collect(),
        }
    }

    fn assignment(role: &Role, user_id: UserId, site_id: Option<SiteId>) -> RoleAssignment {
        RoleAssignment {
            id: AssignmentId::new(),
            org_id: role.org_id,
            user_id,
            role_id: role.id,
            site_id,
        }
    }

    fn policy(org_id: OrgId, capability: &str, enabled: bool) -> OrgPolicy {
        OrgPolicy {
            id: PolicyId::new(),
            org_id,
            capability_key: key(capability),
            enabled,
            created_by: UserId::new(),
        }
    }

    #[test]
    fn unknown_capability_denied_regardless_of_grants() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let admin = role(org_id, "Org Admin", RoleScope::Org, &["builder.publish"]);
        let context = GrantContext::gather(
            &[admin.clone()],
            &[assignment(&admin, user_id, None)],
            &[],
            None,
        );

        let decision = evaluate(&registry(), &context, &key("builder.teleport"));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::UnknownCapability);
    }

    #[test]
    fn missing_role_grant_is_denied() {
        let context = GrantContext::gather(&[], &[], &[], None);

        let decision = evaluate(&registry(), &context, &key("builder.publish"));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::MissingRoleCapability);
        assert!(decision.policy_enabled);
        assert!(decision.role_sources.is_empty());
    }

    #[test]
    fn granted_capability_with_default_policy_is_allowed() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let admin = role(org_id, "Org Admin", RoleScope::Org, &["builder.publish"]);
        let context = GrantContext::gather(
            &[admin.clone()],
            &[assignment(&admin, user_id, None)],
            &[],
            None,
        );

        let decision = evaluate(&registry(), &context, &key("builder.publish"));
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Allowed);
        assert!(decision.policy_enabled);
        assert_eq!(decision.role_sources, vec!["Org Admin".to_owned()]);
    }

    #[test]
    fn explicit_disabled_policy_blocks_granted_capability() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let admin = role(org_id, "Org Admin", RoleScope::Org, &["builder.publish"]);
        let context = GrantContext::gather(
            &[admin.clone()],
            &[assignment(&admin, user_id, None)],
            &[policy(org_id, "builder.publish", false)],
            None,
        );

        let decision = evaluate(&registry(), &context, &key("builder.publish"));
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::BlockedByPolicy);
        assert!(!decision.policy_enabled);
        assert_eq!(decision.role_sources, vec!["Org Admin".to_owned()]);
    }

    #[test]
    fn default_disabled_policy_blocks_without_explicit_row() {
        // marketing.publish defaults to disabled in the builtin catalog.
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let marketer = role(org_id, "Marketer", RoleScope::Org, &["marketing.publish"]);
        let context = GrantContext::gather(
            &[marketer.clone()],
            &[assignment(&marketer, user_id, None)],
            &[],
            None,
        );

        let decision = evaluate(&registry(), &context, &key("marketing.publish"));
        assert_eq!(decision.reason, DecisionReason::BlockedByPolicy);

        let enabled_context = GrantContext::gather(
            &[marketer.clone()],
            &[assignment(&marketer, user_id, None)],
            &[policy(org_id, "marketing.publish", true)],
            None,
        );
        let decision = evaluate(&registry(), &enabled_context, &key("marketing.publish"));
        assert_eq!(decision.reason, DecisionReason::Allowed);
    }

    #[test]
    fn site_role_grants_only_for_its_own_site() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let site_a = SiteId::new();
        let site_b = SiteId::new();
        let editor = role(org_id, "Site Editor", RoleScope::Site, &["builder.edit"]);
        let roles = [editor.clone()];
        let assignments = [assignment(&editor, user_id, Some(site_a))];

        let no_site = GrantContext::gather(&roles, &assignments, &[], None);
        assert_eq!(
            evaluate(&registry(), &no_site, &key("builder.edit")).reason,
            DecisionReason::MissingRoleCapability
        );

        let other_site = GrantContext::gather(&roles, &assignments, &[], Some(site_b));
        assert_eq!(
            evaluate(&registry(), &other_site, &key("builder.edit")).reason,
            DecisionReason::MissingRoleCapability
        );

        let own_site = GrantContext::gather(&roles, &assignments, &[], Some(site_a));
        let decision = evaluate(&registry(), &own_site, &key("builder.edit"));
        assert_eq!(decision.reason, DecisionReason::Allowed);
        assert_eq!(decision.role_sources, vec!["Site Editor".to_owned()]);
    }

    #[test]
    fn org_role_applies_with_and_without_site() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let viewer = role(org_id, "Viewer", RoleScope::Org, &["content.read"]);
        let roles = [viewer.clone()];
        let assignments = [assignment(&viewer, user_id, None)];

        for site_id in [None, Some(SiteId::new())] {
            let context = GrantContext::gather(&roles, &assignments, &[], site_id);
            assert!(evaluate(&registry(), &context, &key("content.read")).allowed);
        }
    }

    #[test]
    fn role_sources_are_sorted_and_distinct() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let zebra = role(org_id, "Zebra", RoleScope::Org, &["content.read"]);
        let alpha = role(org_id, "Alpha", RoleScope::Org, &["content.read"]);
        let roles = [zebra.clone(), alpha.clone()];
        let assignments = [
            assignment(&zebra, user_id, None),
            assignment(&alpha, user_id, None),
        ];

        let context = GrantContext::gather(&roles, &assignments, &[], None);
        let decision = evaluate(&registry(), &context, &key("content.read"));
        assert_eq!(
            decision.role_sources,
            vec!["Alpha".to_owned(), "Zebra".to_owned()]
        );
    }

    #[test]
    fn repeated_evaluation_is_byte_identical() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let admin = role(org_id, "Org Admin", RoleScope::Org, &["builder.publish"]);
        let context = GrantContext::gather(
            &[admin.clone()],
            &[assignment(&admin, user_id, None)],
            &[],
            None,
        );
        let registry = registry();

        let first = evaluate(&registry, &context, &key("builder.publish"));
        let second = evaluate(&registry, &context, &key("builder.publish"));
        assert_eq!(
            serde_json::to_string(&first).unwrap_or_default(),
            serde_json::to_string(&second).unwrap_or_default()
        );
        assert!(!serde_json::to_string(&first).unwrap_or_default().is_empty());
    }

    #[test]
    fn bulk_listing_agrees_with_single_evaluation() {
        let org_id = OrgId::new();
        let user_id = UserId::new();
        let admin = role(
            org_id,
            "Org Admin",
            RoleScope::Org,
            &["builder.publish", "content.read", "webhooks.manage"],
        );
        let registry = registry();
        let context = GrantContext::gather(
            &[admin.clone()],
            &[assignment(&admin, user_id, None)],
            &[policy(org_id, "webhooks.manage", false)],
            None,
        );

        for effective in effective_capabilities(&registry, &context) {
            let single = evaluate(&registry, &context, &effective.key);
            assert_eq!(effective.decision, single);
        }
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn catalog_keys() -> Vec<&'static str> {
            vec![
                "builder.edit",
                "builder.publish",
                "content.read",
                "content.write",
                "marketing.publish",
                "webhooks.manage",
            ]
        }

        proptest! {
            #[test]
            fn bulk_and_single_decisions_always_agree(
                grant_mask in proptest::collection::vec(any::<bool>(), 6),
                policy_mask in proptest::collection::vec(proptest::option::of(any::<bool>()), 6),
                with_site in any::<bool>(),
            ) {
                let org_id = OrgId::new();
                let user_id = UserId::new();
                let site_id = with_site.then(SiteId::new);

                let granted: Vec<&str> = catalog_keys()
                    .into_iter()
                    .zip(grant_mask.iter())
                    .filter_map(|(key, granted)| granted.then_some(key))
                    .collect();
                let granting_role = role(org_id, "Granting Role", RoleScope::Org, &granted);

                let policies: Vec<OrgPolicy> = catalog_keys()
                    .into_iter()
                    .zip(policy_mask.iter())
                    .filter_map(|(key, row)| row.map(|enabled| policy(org_id, key, enabled)))
                    .collect();

                let registry = registry();
                let context = GrantContext::gather(
                    &[granting_role.clone()],
                    &[assignment(&granting_role, user_id, None)],
                    &policies,
                    site_id,
                );

                for effective in effective_capabilities(&registry, &context) {
                    let single = evaluate(&registry, &context, &effective.key);
                    prop_assert_eq!(&effective.decision, &single);

                    // Determinism: a second evaluation is identical.
                    let again = evaluate(&registry, &context, &effective.key);
                    prop_assert_eq!(&single, &again);

                    let mut sorted = single.role_sources.clone();
                    sorted.sort();
                    sorted.dedup();
                    prop_assert_eq!(&single.role_sources, &sorted);
                }
            }
        }
    }

    #[test]
    fn capability_sets_stay_ordered() {
        let mut keys = BTreeSet::new();
        keys.insert(key("content.write"));
        keys.insert(key("builder.edit"));
        let ordered: Vec<_> = keys.iter().map(CapabilityKey::as_str).collect();
        assert_eq!(ordered, vec!["builder.edit", "content.write"]);
    }
}
