use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use pagecraft_core::{AppError, AppResult, OrgId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::{CapabilityKey, CapabilityRegistry};

/// Stable role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Distinguishes platform-managed roles from tenant-defined ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    /// Seeded by the platform; immutable through the management operations.
    System,
    /// Created by an organization administrator.
    Custom,
}

impl RoleType {
    /// Returns a stable storage value for this role type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
        }
    }

    /// Parses a stable storage value into a role type.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "system" => Ok(Self::System),
            "custom" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "unknown role type value '{value}'"
            ))),
        }
    }
}

/// Grant scope of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Grants apply across the whole organization.
    Org,
    /// Grants apply only within one named site.
    Site,
}

impl RoleScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Site => "site",
        }
    }

    /// Parses a stable storage value into a scope.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "org" => Ok(Self::Org),
            "site" => Ok(Self::Site),
            _ => Err(AppError::Validation(format!(
                "unknown role scope value '{value}'"
            ))),
        }
    }
}

/// A named bundle of capabilities owned by one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Unique name per organization and scope.
    pub name: String,
    /// Administrative description.
    pub description: String,
    /// System or custom.
    pub role_type: RoleType,
    /// Org-wide or site-pinned grants.
    pub scope: RoleScope,
    /// Immutable roles reject updates and deletion; true for all system roles.
    pub is_immutable: bool,
    /// Capability keys granted by this role.
    pub capabilities: BTreeSet<CapabilityKey>,
}

impl Role {
    /// Returns whether the management operations may mutate or delete this role.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.role_type == RoleType::Custom && !self.is_immutable
    }
}

/// Validates a capability set for a custom role against the registry.
///
/// Every key must be registered and must not carry
/// `blocked_for_custom_roles`.
pub fn validate_custom_role_capabilities(
    registry: &CapabilityRegistry,
    keys: &BTreeSet<CapabilityKey>,
) -> AppResult<()> {
    for key in keys {
        let capability = registry.lookup(key).ok_or_else(|| {
            AppError::Validation(format!("capability '{key}' is not registered"))
        })?;

        if capability.blocked_for_custom_roles {
            return Err(AppError::Validation(format!(
                "capability '{key}' may not be granted to a custom role"
            )));
        }
    }

    Ok(())
}
