use async_trait::async_trait;
use pagecraft_core::{AppResult, OrgId};
use pagecraft_domain::OrgPolicy;

/// Repository port for organization capability policy storage.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Lists every policy row for the organization.
    async fn list_policies(&self, org_id: OrgId) -> AppResult<Vec<OrgPolicy>>;

    /// Inserts or updates the single row for (organization, capability key).
    ///
    /// An existing row keeps its identifier; only `enabled` and `created_by`
    /// change. Returns the stored row.
    async fn upsert_policy(&self, policy: OrgPolicy) -> AppResult<OrgPolicy>;
}
