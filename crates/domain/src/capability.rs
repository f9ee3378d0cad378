use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use pagecraft_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A validated dotted capability key, e.g. `builder.publish`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityKey(String);

impl CapabilityKey {
    /// Creates a validated capability key.
    ///
    /// Keys are lowercase dotted identifiers: at least two segments of
    /// `[a-z0-9_]` separated by single dots.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let segments: Vec<&str> = value.split('.').collect();

        let well_formed = segments.len() >= 2
            && segments.iter().all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|character| character.is_ascii_lowercase()
                            || character.is_ascii_digit()
                            || character == '_')
            });

        if !well_formed {
            return Err(AppError::Validation(format!(
                "capability key '{value}' is not a dotted lowercase identifier"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the namespace segment before the first dot.
    #[must_use]
    pub fn module(&self) -> &str {
        self.0.split('.').next().unwrap_or(self.0.as_str())
    }
}

impl Display for CapabilityKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl TryFrom<String> for CapabilityKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CapabilityKey> for String {
    fn from(value: CapabilityKey) -> Self {
        value.0
    }
}

/// Relative risk attached to a capability for administrative display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Read-only or otherwise harmless.
    Low,
    /// Mutates tenant content.
    Medium,
    /// Affects public-facing state or outbound traffic.
    High,
    /// Affects billing or the security configuration itself.
    Critical,
}

/// A registered fine-grained permission and its metadata.
///
/// The catalog is loaded at process start and treated as constant for the
/// process lifetime; the engine never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Unique dotted key.
    pub key: CapabilityKey,
    /// Namespace the capability belongs to.
    pub module: String,
    /// Short human-readable name.
    pub label: String,
    /// Longer administrative description.
    pub description: String,
    /// Relative risk for administrative display.
    pub risk_level: RiskLevel,
    /// Marks capabilities that can cause irreversible or outward-facing effects.
    pub is_dangerous: bool,
    /// Whether an organization may toggle this capability off via policy.
    pub can_be_policy_controlled: bool,
    /// Whether the key may never be granted to a non-system role.
    pub blocked_for_custom_roles: bool,
    /// Policy value assumed when no explicit policy row exists.
    pub default_policy_enabled: bool,
}

/// Process-wide, read-only catalog of known capabilities.
///
/// Iteration order is the construction order and is stable, which the
/// effective-capabilities listing relies on.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
    index: HashMap<CapabilityKey, usize>,
}

impl CapabilityRegistry {
    /// Creates a registry from a catalog, rejecting duplicate keys.
    pub fn new(entries: Vec<Capability>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(entries.len());

        for (position, capability) in entries.iter().enumerate() {
            if index.insert(capability.key.clone(), position).is_some() {
                return Err(AppError::Validation(format!(
                    "duplicate capability key '{}' in registry catalog",
                    capability.key
                )));
            }
        }

        Ok(Self { entries, index })
    }

    /// Returns the capability registered under the key, if any.
    #[must_use]
    pub fn lookup(&self, key: &CapabilityKey) -> Option<&Capability> {
        self.index
            .get(key)
            .and_then(|position| self.entries.get(*position))
    }

    /// Returns the full catalog in stable order.
    #[must_use]
    pub fn all(&self) -> &[Capability] {
        self.entries.as_slice()
    }

    /// Returns the built-in content-platform catalog.
    pub fn builtin() -> AppResult<Self> {
        let catalog = [
            // key, label, description, risk, dangerous, policy-controlled, blocked-for-custom, default-enabled
            (
                "builder.edit",
                "Edit pages",
                "Edit draft pages and layouts in the site builder.",
                RiskLevel::Medium,
                false,
                true,
                false,
                true,
            ),
            (
                "builder.publish",
                "Publish pages",
                "Publish builder changes to the live site.",
                RiskLevel::High,
                true,
                true,
                false,
                true,
            ),
            (
                "content.read",
                "Read content",
                "Read content entries and their version history.",
                RiskLevel::Low,
                false,
                false,
                false,
                true,
            ),
            (
                "content.write",
                "Write content",
                "Create and update content entries.",
                RiskLevel::Medium,
                false,
                true,
                false,
                true,
            ),
            (
                "content.delete",
                "Delete content",
                "Permanently delete content entries.",
                RiskLevel::High,
                true,
                true,
                false,
                true,
            ),
            (
                "collections.manage",
                "Manage collections",
                "Create, reorder and delete content collections.",
                RiskLevel::Medium,
                false,
                true,
                false,
                true,
            ),
            (
                "webhooks.manage",
                "Manage webhooks",
                "Configure outbound webhook endpoints and secrets.",
                RiskLevel::High,
                true,
                true,
                false,
                true,
            ),
            (
                "marketing.publish",
                "Publish marketing",
                "Publish marketing campaigns and landing pages.",
                RiskLevel::High,
                true,
                true,
                false,
                false,
            ),
            (
                "sites.manage",
                "Manage sites",
                "Create, rename and delete sites within the organization.",
                RiskLevel::High,
                true,
                true,
                false,
                true,
            ),
            (
                "org.members_manage",
                "Manage members",
                "Invite and remove organization members.",
                RiskLevel::High,
                true,
                false,
                false,
                true,
            ),
            (
                "security.roles_manage",
                "Manage roles",
                "Create custom roles and manage role assignments.",
                RiskLevel::Critical,
                true,
                false,
                true,
                true,
            ),
            (
                "security.policies_manage",
                "Manage policies",
                "Toggle organization capability policies.",
                RiskLevel::Critical,
                true,
                false,
                true,
                true,
            ),
            (
                "billing.view_plan",
                "View plan",
                "View the organization's subscription plan and invoices.",
                RiskLevel::Medium,
                false,
                false,
                true,
                true,
            ),
            (
                "billing.manage_subscription",
                "Manage subscription",
                "Change or cancel the organization's subscription.",
                RiskLevel::Critical,
                true,
                false,
                true,
                true,
            ),
        ];

        let mut entries = Vec::with_capacity(catalog.len());
        for (
            key,
            label,
            description,
            risk_level,
            is_dangerous,
            can_be_policy_controlled,
            blocked_for_custom_roles,
            default_policy_enabled,
        ) in catalog
        {
            let key = CapabilityKey::new(key)?;
            let module = key.module().to_owned();
            entries.push(Capability {
                key,
                module,
                label: label.to_owned(),
                description: description.to_owned(),
                risk_level,
                is_dangerous,
                can_be_policy_controlled,
                blocked_for_custom_roles,
                default_policy_enabled,
            });
        }

        Self::new(entries)
    }
}
