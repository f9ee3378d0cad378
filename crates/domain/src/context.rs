use pagecraft_core::{OrgId, SiteId};
use serde::{Deserialize, Serialize};

/// Immutable tenant identity pinned for the remainder of a request.
///
/// Threaded as an explicit value through downstream calls; never attached to
/// mutable request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Organization the request operates against.
    pub org_id: OrgId,
    /// Site within the organization, when the request names one.
    pub site_id: Option<SiteId>,
}

impl TenantContext {
    /// Creates an org-wide context.
    #[must_use]
    pub fn for_org(org_id: OrgId) -> Self {
        Self {
            org_id,
            site_id: None,
        }
    }

    /// Creates a site-pinned context.
    #[must_use]
    pub fn for_site(org_id: OrgId, site_id: SiteId) -> Self {
        Self {
            org_id,
            site_id: Some(site_id),
        }
    }
}

/// Outcome of per-request tenant identity resolution.
///
/// A request moves `Unresolved -> Resolving -> Resolved | Rejected`;
/// rejection surfaces as an error from the resolver, so only the two
/// terminal success states are represented here. `Unresolved` is a
/// deliberate pass-through for genuinely public routes, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextResolution {
    /// No candidate organization identifier was found anywhere.
    Unresolved,
    /// Organization (and optionally site) identity validated and pinned.
    Resolved(TenantContext),
}

impl ContextResolution {
    /// Returns the resolved context, if any.
    #[must_use]
    pub fn context(&self) -> Option<TenantContext> {
        match self {
            Self::Resolved(context) => Some(*context),
            Self::Unresolved => None,
        }
    }
}
