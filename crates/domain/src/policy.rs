use std::fmt::{Display, Formatter};

use pagecraft_core::{OrgId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::CapabilityKey;

/// Stable organization policy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(Uuid);

impl PolicyId {
    /// Creates a random policy identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a policy identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PolicyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PolicyId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An organization-level on/off override for one capability.
///
/// Absence of a row means the capability's `default_policy_enabled` applies.
/// At most one row exists per (organization, capability key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgPolicy {
    /// Stable policy identifier.
    pub id: PolicyId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Capability the override applies to.
    pub capability_key: CapabilityKey,
    /// Whether the capability is usable at all in this organization.
    pub enabled: bool,
    /// Administrator who last upserted the row.
    pub created_by: UserId,
}
