use pagecraft_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Machine-checkable reason attached to every decision.
///
/// The string codes are part of the persisted contract and must not be
/// renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The capability is granted and not blocked by policy.
    Allowed,
    /// The capability key is absent from the registry.
    UnknownCapability,
    /// No applicable role grants the capability.
    MissingRoleCapability,
    /// A role grants the capability but the organization policy disables it.
    BlockedByPolicy,
}

impl DecisionReason {
    /// Returns the stable wire code for this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::UnknownCapability => "unknown_capability",
            Self::MissingRoleCapability => "missing_role_capability",
            Self::BlockedByPolicy => "blocked_by_policy",
        }
    }

    /// Parses a stable wire code into a reason.
    pub fn from_wire(value: &str) -> AppResult<Self> {
        match value {
            "allowed" => Ok(Self::Allowed),
            "unknown_capability" => Ok(Self::UnknownCapability),
            "missing_role_capability" => Ok(Self::MissingRoleCapability),
            "blocked_by_policy" => Ok(Self::BlockedByPolicy),
            _ => Err(AppError::Validation(format!(
                "unknown decision reason code '{value}'"
            ))),
        }
    }
}

/// The evaluator's output for one (user, organization, capability, site) query.
///
/// Repeated evaluation against unchanged store state yields a byte-identical
/// value; `role_sources` is sorted lexicographically for that purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the capability may be exercised.
    pub allowed: bool,
    /// Machine-checkable reason code.
    pub reason: DecisionReason,
    /// Resolved policy value for the capability in this organization.
    pub policy_enabled: bool,
    /// Sorted, distinct names of the roles that grant the capability.
    pub role_sources: Vec<String>,
}

impl Decision {
    /// Denial for a capability key absent from the registry.
    ///
    /// Matches the evaluator's output for an unregistered key: no policy
    /// row can exist for it and no role can grant it.
    #[must_use]
    pub fn unknown_capability() -> Self {
        Self {
            allowed: false,
            reason: DecisionReason::UnknownCapability,
            policy_enabled: false,
            role_sources: Vec::new(),
        }
    }
}
