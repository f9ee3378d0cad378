use std::sync::Arc;

use pagecraft_core::{AppError, OrgId, SiteId, UserId};
use pagecraft_domain::{
    CapabilityKey, CapabilityRegistry, DecisionReason, RoleScope,
};

use super::AccessService;
use crate::access_ports::CreateRoleInput;
use crate::policy_service::PolicyService;
use crate::role_service::RoleService;
use crate::test_support::FakeAccessStore;

fn registry() -> Arc<CapabilityRegistry> {
    match CapabilityRegistry::builtin() {
        Ok(registry) => Arc::new(registry),
        Err(error) => panic!("builtin registry must construct: {error}"),
    }
}

fn key(value: &str) -> CapabilityKey {
    match CapabilityKey::new(value) {
        Ok(key) => key,
        Err(error) => panic!("test key must be valid: {error}"),
    }
}

struct Fixture {
    store: Arc<FakeAccessStore>,
    access: AccessService,
    roles: RoleService,
    policies: PolicyService,
    org_id: OrgId,
    user_id: UserId,
    actor: UserId,
}

async fn fixture() -> Fixture {
    let store = Arc::new(FakeAccessStore::default());
    let registry = registry();
    let access = AccessService::new(
        registry.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let roles = RoleService::new(
        registry.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let policies = PolicyService::new(registry, store.clone(), store.clone());

    let org_id = OrgId::new();
    let user_id = UserId::new();
    store.seed_org(org_id, "Acme").await;
    store.seed_member(org_id, user_id).await;

    Fixture {
        store,
        access,
        roles,
        policies,
        org_id,
        user_id,
        actor: UserId::new(),
    }
}

async fn grant_role(
    fixture: &Fixture,
    name: &str,
    scope: RoleScope,
    capability_keys: &[&str],
    site_id: Option<SiteId>,
) {
    let role = fixture
        .roles
        .create_role(
            fixture.org_id,
            fixture.actor,
            CreateRoleInput {
                name: name.to_owned(),
                description: String::new(),
                scope,
                capability_keys: capability_keys
                    .iter()
                    .filter_map(|value| CapabilityKey::new(*value).ok())
                    .collect(),
            },
        )
        .await;
    let role = match role {
        Ok(role) => role,
        Err(error) => panic!("role creation must succeed: {error}"),
    };

    fixture
        .store
        .seed_scoped_assignment_for_test(fixture.org_id, fixture.user_id, role.id, site_id)
        .await;
}

#[tokio::test]
async fn publish_scenario_allows_with_default_policy() {
    let fixture = fixture().await;
    grant_role(&fixture, "Org Admin", RoleScope::Org, &["builder.publish"], None).await;

    let decision = fixture
        .access
        .evaluate(fixture.user_id, fixture.org_id, &key("builder.publish"), None)
        .await;

    assert!(decision.is_ok());
    if let Ok(decision) = decision {
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Allowed);
        assert!(decision.policy_enabled);
        assert_eq!(decision.role_sources, vec!["Org Admin".to_owned()]);
    }
}

#[tokio::test]
async fn publish_scenario_blocked_by_explicit_policy() {
    let fixture = fixture().await;
    grant_role(&fixture, "Org Admin", RoleScope::Org, &["builder.publish"], None).await;

    let upserted = fixture
        .policies
        .upsert_policy(fixture.org_id, fixture.actor, key("builder.publish"), false)
        .await;
    assert!(upserted.is_ok());

    let decision = fixture
        .access
        .evaluate(fixture.user_id, fixture.org_id, &key("builder.publish"), None)
        .await;

    assert!(decision.is_ok());
    if let Ok(decision) = decision {
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::BlockedByPolicy);
        assert!(!decision.policy_enabled);
        assert_eq!(decision.role_sources, vec!["Org Admin".to_owned()]);
    }
}

#[tokio::test]
async fn site_grant_is_invisible_without_matching_site() {
    let fixture = fixture().await;
    let site_a = SiteId::new();
    let site_b = SiteId::new();
    grant_role(
        &fixture,
        "Site Editor",
        RoleScope::Site,
        &["builder.edit"],
        Some(site_a),
    )
    .await;

    for queried in [None, Some(site_b)] {
        let decision = fixture
            .access
            .evaluate(fixture.user_id, fixture.org_id, &key("builder.edit"), queried)
            .await;
        assert!(
            decision.is_ok_and(|decision| decision.reason
                == DecisionReason::MissingRoleCapability)
        );
    }

    let decision = fixture
        .access
        .evaluate(
            fixture.user_id,
            fixture.org_id,
            &key("builder.edit"),
            Some(site_a),
        )
        .await;
    assert!(decision.is_ok_and(|decision| decision.allowed));
}

#[tokio::test]
async fn effective_capabilities_matches_single_evaluation() {
    let fixture = fixture().await;
    grant_role(
        &fixture,
        "Org Admin",
        RoleScope::Org,
        &["builder.publish", "content.read"],
        None,
    )
    .await;
    let upserted = fixture
        .policies
        .upsert_policy(fixture.org_id, fixture.actor, key("content.write"), false)
        .await;
    assert!(upserted.is_ok());

    let listing = fixture
        .access
        .effective_capabilities(fixture.user_id, fixture.org_id, None)
        .await
        .unwrap_or_default();
    assert!(!listing.is_empty());

    for effective in listing {
        let single = fixture
            .access
            .evaluate(fixture.user_id, fixture.org_id, &effective.key, None)
            .await;
        assert!(single.is_ok_and(|single| single == effective.decision));
    }
}

#[tokio::test]
async fn has_capability_is_a_projection_of_evaluate() {
    let fixture = fixture().await;
    grant_role(&fixture, "Viewer", RoleScope::Org, &["content.read"], None).await;

    let allowed = fixture
        .access
        .has_capability(fixture.user_id, fixture.org_id, &key("content.read"), None)
        .await;
    assert!(allowed.is_ok_and(|allowed| allowed));

    let denied = fixture
        .access
        .has_capability(fixture.user_id, fixture.org_id, &key("content.write"), None)
        .await;
    assert!(denied.is_ok_and(|denied| !denied));
}

#[tokio::test]
async fn require_capability_surfaces_reason_code_only() {
    let fixture = fixture().await;

    let result = fixture
        .access
        .require_capability(fixture.user_id, fixture.org_id, &key("builder.publish"), None)
        .await;

    match result {
        Err(AppError::Forbidden(message)) => {
            assert!(message.contains("builder.publish"));
            assert!(message.contains("missing_role_capability"));
            assert!(!message.contains("Org Admin"));
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_capability_string_decides_unknown_not_validation() {
    let fixture = fixture().await;

    for raw in ["", "noseparator", "bad key.with spaces", "trailing."] {
        let decision = fixture
            .access
            .evaluate_raw(fixture.user_id, fixture.org_id, raw, None)
            .await;

        assert!(decision.is_ok_and(|decision| {
            !decision.allowed
                && decision.reason == DecisionReason::UnknownCapability
                && !decision.policy_enabled
                && decision.role_sources.is_empty()
        }));
    }
}

#[tokio::test]
async fn evaluate_raw_agrees_with_evaluate_for_well_formed_keys() {
    let fixture = fixture().await;
    grant_role(&fixture, "Viewer", RoleScope::Org, &["content.read"], None).await;

    let raw = fixture
        .access
        .evaluate_raw(fixture.user_id, fixture.org_id, "content.read", None)
        .await;
    let typed = fixture
        .access
        .evaluate(fixture.user_id, fixture.org_id, &key("content.read"), None)
        .await;

    match (raw, typed) {
        (Ok(raw), Ok(typed)) => assert_eq!(raw, typed),
        other => panic!("both evaluations must succeed: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_capability_reported_for_unregistered_key() {
    let fixture = fixture().await;

    let decision = fixture
        .access
        .evaluate(
            fixture.user_id,
            fixture.org_id,
            &key("builder.teleport"),
            None,
        )
        .await;

    assert!(
        decision.is_ok_and(|decision| decision.reason == DecisionReason::UnknownCapability)
    );
}
