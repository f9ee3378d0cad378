use async_trait::async_trait;
use pagecraft_core::{AppResult, OrgId, SiteId, UserId};

/// Organization record projection from the platform directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgRecord {
    /// Stable organization identifier.
    pub id: OrgId,
    /// Display name.
    pub name: String,
}

/// Site record projection from the platform directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    /// Stable site identifier.
    pub id: SiteId,
    /// Owning organization.
    pub org_id: OrgId,
    /// Display name.
    pub name: String,
}

/// Port for organization, site and membership lookups.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Finds an organization by identifier.
    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<OrgRecord>>;

    /// Finds a site by identifier.
    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<SiteRecord>>;

    /// Returns whether the user is a member of the organization.
    async fn is_member(&self, org_id: OrgId, user_id: UserId) -> AppResult<bool>;
}
