use std::sync::Arc;

use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserIdentity};
use pagecraft_domain::{ContextResolution, TenantContext};

use crate::access_ports::DirectoryRepository;

/// Raw tenant identifiers extracted from one request, before validation.
///
/// Extraction precedence per field: explicit header, then query parameter,
/// then (for the organization) the authenticated credential's claim. First
/// non-empty wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentifiers {
    /// Organization identifier from the dedicated header.
    pub header_org: Option<String>,
    /// Organization identifier from the query string.
    pub query_org: Option<String>,
    /// Site identifier from the dedicated header.
    pub header_site: Option<String>,
    /// Site identifier from the query string.
    pub query_site: Option<String>,
}

impl RequestIdentifiers {
    fn org_candidate(&self) -> Option<&str> {
        first_non_empty(&[self.header_org.as_deref(), self.query_org.as_deref()])
    }

    fn site_candidate(&self) -> Option<&str> {
        first_non_empty(&[self.header_site.as_deref(), self.query_site.as_deref()])
    }
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Per-request tenant and site identity resolution.
///
/// Identifiers are validated for UUID shape before any directory lookup.
/// A request with no candidate organization anywhere stays unresolved and
/// proceeds, which permits genuinely public routes.
#[derive(Clone)]
pub struct ContextResolver {
    directory: Arc<dyn DirectoryRepository>,
}

impl ContextResolver {
    /// Creates a resolver over the platform directory.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }

    /// Resolves the tenant context for one request.
    pub async fn resolve(
        &self,
        identifiers: &RequestIdentifiers,
        identity: Option<&UserIdentity>,
    ) -> AppResult<ContextResolution> {
        let org_id = match identifiers.org_candidate() {
            Some(candidate) => OrgId::parse(candidate)?,
            None => match identity {
                Some(identity) => identity.org_id(),
                None => return Ok(ContextResolution::Unresolved),
            },
        };

        if self.directory.find_org(org_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "organization '{org_id}' was not found"
            )));
        }

        if let Some(identity) = identity {
            if identity.org_id() != org_id {
                return Err(AppError::Forbidden(format!(
                    "credential was issued for another organization than '{org_id}'"
                )));
            }

            if !self.directory.is_member(org_id, identity.user_id()).await? {
                return Err(AppError::Forbidden(format!(
                    "user '{}' is not a member of organization '{org_id}'",
                    identity.user_id()
                )));
            }
        }

        let site_id = match identifiers.site_candidate() {
            Some(candidate) => Some(self.resolve_site(org_id, candidate).await?),
            None => None,
        };

        Ok(ContextResolution::Resolved(TenantContext {
            org_id,
            site_id,
        }))
    }

    async fn resolve_site(&self, org_id: OrgId, candidate: &str) -> AppResult<SiteId> {
        let site_id = SiteId::parse(candidate)?;

        let site = self
            .directory
            .find_site(site_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("site '{site_id}' was not found")))?;

        if site.org_id != org_id {
            return Err(AppError::Validation(format!(
                "site '{site_id}' does not belong to organization '{org_id}'"
            )));
        }

        Ok(site_id)
    }
}
