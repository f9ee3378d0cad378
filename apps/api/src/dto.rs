use pagecraft_domain::{Decision, EffectiveCapability, OrgPolicy, Role, RoleAssignment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role representation returned by the API.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub role_type: String,
    pub scope: String,
    pub is_immutable: bool,
    pub capabilities: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id.as_uuid(),
            org_id: role.org_id.as_uuid(),
            name: role.name,
            description: role.description,
            role_type: role.role_type.as_str().to_owned(),
            scope: role.scope.as_str().to_owned(),
            is_immutable: role.is_immutable,
            capabilities: role
                .capabilities
                .into_iter()
                .map(|key| key.as_str().to_owned())
                .collect(),
        }
    }
}

/// Payload for creating a custom role.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scope: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Payload for updating a custom role; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capabilities: Option<Vec<String>>,
}

/// Query flags for role deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteRoleQuery {
    #[serde(default)]
    pub force: bool,
}

/// Role assignment representation returned by the API.
#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub site_id: Option<Uuid>,
}

impl From<RoleAssignment> for AssignmentResponse {
    fn from(assignment: RoleAssignment) -> Self {
        Self {
            id: assignment.id.as_uuid(),
            org_id: assignment.org_id.as_uuid(),
            user_id: assignment.user_id.as_uuid(),
            role_id: assignment.role_id.as_uuid(),
            site_id: assignment.site_id.map(|site| site.as_uuid()),
        }
    }
}

/// Payload for granting a role to a user.
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub site_id: Option<Uuid>,
}

/// Policy row representation returned by the API.
#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub capability_key: String,
    pub enabled: bool,
    pub created_by: Uuid,
}

impl From<OrgPolicy> for PolicyResponse {
    fn from(policy: OrgPolicy) -> Self {
        Self {
            capability_key: policy.capability_key.as_str().to_owned(),
            enabled: policy.enabled,
            created_by: policy.created_by.as_uuid(),
        }
    }
}

/// Payload for toggling one capability policy.
#[derive(Debug, Deserialize)]
pub struct UpsertPolicyRequest {
    pub capability_key: String,
    pub enabled: bool,
}

/// Payload for a single capability check.
#[derive(Debug, Deserialize)]
pub struct CheckCapabilityRequest {
    pub capability: String,
}

/// One capability decision returned by the API.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub capability: String,
    #[serde(flatten)]
    pub decision: Decision,
}

/// One effective-capability entry returned by the API.
#[derive(Debug, Serialize)]
pub struct EffectiveCapabilityResponse {
    pub capability: String,
    #[serde(flatten)]
    pub decision: Decision,
}

impl From<EffectiveCapability> for EffectiveCapabilityResponse {
    fn from(entry: EffectiveCapability) -> Self {
        Self {
            capability: entry.key.as_str().to_owned(),
            decision: entry.decision,
        }
    }
}
