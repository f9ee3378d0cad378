use pagecraft_core::AppError;
use pagecraft_domain::CapabilityKey;

use crate::error::ApiError;

pub mod assignments;
pub mod capabilities;
pub mod health;
pub mod policies;
pub mod roles;

/// Capability required to manage roles and assignments.
pub const MANAGE_ROLES: &str = "security.roles_manage";

/// Capability required to manage organization policies.
pub const MANAGE_POLICIES: &str = "security.policies_manage";

fn capability_key(value: &str) -> Result<CapabilityKey, ApiError> {
    CapabilityKey::new(value)
        .map_err(|error| ApiError(AppError::Internal(format!("bad capability key: {error}"))))
}
