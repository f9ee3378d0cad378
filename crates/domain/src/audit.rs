use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is updated.
    RoleUpdated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a role is assigned to a user.
    AssignmentCreated,
    /// Emitted when a role assignment is removed.
    AssignmentDeleted,
    /// Emitted when an organization capability policy is upserted.
    PolicyUpserted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "access.role.created",
            Self::RoleUpdated => "access.role.updated",
            Self::RoleDeleted => "access.role.deleted",
            Self::AssignmentCreated => "access.assignment.created",
            Self::AssignmentDeleted => "access.assignment.deleted",
            Self::PolicyUpserted => "access.policy.upserted",
        }
    }
}
