use serde::{Deserialize, Serialize};

use crate::{OrgId, UserId};

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    display_name: String,
    email: Option<String>,
    org_id: OrgId,
}

impl UserIdentity {
    /// Creates a user identity from authentication and tenancy data.
    #[must_use]
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        email: Option<String>,
        org_id: OrgId,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            email,
            org_id,
        }
    }

    /// Returns the stable user identifier from the platform directory.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the identity provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the organization the credential was issued for.
    #[must_use]
    pub fn org_id(&self) -> OrgId {
        self.org_id
    }
}
