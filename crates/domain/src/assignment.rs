use std::fmt::{Display, Formatter};

use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::{RoleId, RoleScope};

/// Stable role assignment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
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

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A grant of one role to one user, optionally pinned to one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable assignment identifier.
    pub id: AssignmentId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Grantee.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Site the grant is pinned to; present iff the role is site-scoped.
    pub site_id: Option<SiteId>,
}

/// Validates the site binding rule for an assignment.
///
/// `site_id` must be present iff the role's scope is `Site`.
pub fn validate_site_binding(scope: RoleScope, site_id: Option<SiteId>) -> AppResult<()> {
    match (scope, site_id) {
        (RoleScope::Site, None) => Err(AppError::Validation(
            "a site-scoped role assignment requires a site".to_owned(),
        )),
        (RoleScope::Org, Some(site_id)) => Err(AppError::Validation(format!(
            "an org-scoped role assignment must not name a site (got '{site_id}')"
        ))),
        _ => Ok(()),
    }
}
