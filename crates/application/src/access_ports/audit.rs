use async_trait::async_trait;
use pagecraft_core::{AppResult, OrgId, UserId};
use pagecraft_domain::AuditAction;

/// One audit log entry emitted by a management operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Organization the event belongs to.
    pub org_id: OrgId,
    /// Acting user.
    pub actor: UserId,
    /// Stable action code.
    pub action: AuditAction,
    /// Resource kind, e.g. `access_role`.
    pub resource_type: String,
    /// Resource identifier within its kind.
    pub resource_id: String,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Port for appending audit log entries.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one event to the audit log.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
