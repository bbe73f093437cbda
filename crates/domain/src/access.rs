use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use constructmate_core::{AppError, AppResult, NonEmptyString, OrganisationId};
use serde::{Deserialize, Serialize};

const ADMIN_ROLE_NAME: &str = "admin";
const PRIVILEGED_ROLE_NAMES: &[&str] = &["admin", "administrator", "super-admin", "superadmin"];

/// Lowercases and trims a role name for comparisons.
#[must_use]
pub fn normalize_role_name(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns whether the role name is the distinguished super-role.
#[must_use]
pub fn is_admin_role_name(value: &str) -> bool {
    normalize_role_name(value) == ADMIN_ROLE_NAME
}

/// Returns whether the role name is the super-role or one of its synonyms.
///
/// Privileged roles never take part in the role/page mapping grid.
#[must_use]
pub fn is_privileged_role_name(value: &str) -> bool {
    let normalized = normalize_role_name(value);
    PRIVILEGED_ROLE_NAMES.contains(&normalized.as_str())
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a non-blank value.
            pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation(format!(
                        "{} must not be empty",
                        $label
                    )));
                }

                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the identifier as text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(self.0.as_str())
            }
        }
    };
}

opaque_id!(
    /// Opaque role identifier.
    RoleId,
    "role id"
);
opaque_id!(
    /// Opaque page identifier.
    PageId,
    "page id"
);

/// Named permission bucket assigned to users of one organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    organisation_id: Option<OrganisationId>,
    rank: Option<i64>,
}

impl Role {
    /// Creates a validated role.
    pub fn new(
        id: RoleId,
        name: impl AsRef<str>,
        organisation_id: Option<OrganisationId>,
        rank: Option<i64>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::trimmed(name)?,
            organisation_id,
            rank,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> &RoleId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the owning organisation when the payload carried it.
    #[must_use]
    pub fn organisation_id(&self) -> Option<&OrganisationId> {
        self.organisation_id.as_ref()
    }

    /// Returns the role rank when the payload carried it.
    #[must_use]
    pub fn rank(&self) -> Option<i64> {
        self.rank
    }

    /// Returns whether the role name matches, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn matches_name(&self, role_name: &str) -> bool {
        normalize_role_name(self.name.as_str()) == normalize_role_name(role_name)
    }

    /// Returns whether this role is the super-role or one of its synonyms.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        is_privileged_role_name(self.name.as_str())
    }
}

/// Navigable application section subject to access control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    id: PageId,
    name: NonEmptyString,
    organisation_id: Option<OrganisationId>,
}

impl Page {
    /// Creates a validated page.
    pub fn new(
        id: PageId,
        name: impl AsRef<str>,
        organisation_id: Option<OrganisationId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::trimmed(name)?,
            organisation_id,
        })
    }

    /// Returns the page identifier.
    #[must_use]
    pub fn id(&self) -> &PageId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the owning organisation when the payload carried it.
    #[must_use]
    pub fn organisation_id(&self) -> Option<&OrganisationId> {
        self.organisation_id.as_ref()
    }

    /// Returns whether the display name contains an already-normalized keyword.
    #[must_use]
    pub fn name_contains(&self, normalized_keyword: &str) -> bool {
        !normalized_keyword.is_empty()
            && self
                .name
                .as_str()
                .to_lowercase()
                .contains(normalized_keyword)
    }
}

/// Pages one role may access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePageMapping {
    role_id: RoleId,
    page_ids: BTreeSet<PageId>,
}

impl RolePageMapping {
    /// Creates a mapping for a role.
    #[must_use]
    pub fn new(role_id: RoleId, page_ids: impl IntoIterator<Item = PageId>) -> Self {
        Self {
            role_id,
            page_ids: page_ids.into_iter().collect(),
        }
    }

    /// Returns the mapped role.
    #[must_use]
    pub fn role_id(&self) -> &RoleId {
        &self.role_id
    }

    /// Returns the mapped pages.
    #[must_use]
    pub fn page_ids(&self) -> &BTreeSet<PageId> {
        &self.page_ids
    }

    /// Folds another row for the same role into this mapping.
    pub fn merge(&mut self, other: RolePageMapping) -> AppResult<()> {
        if other.role_id != self.role_id {
            return Err(AppError::Validation(format!(
                "cannot merge mapping for role '{}' into role '{}'",
                other.role_id, self.role_id
            )));
        }

        self.page_ids.extend(other.page_ids);
        Ok(())
    }
}

/// Page identity used for an access check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageSelector {
    /// Exact page id membership.
    Id(PageId),
    /// Case-insensitive substring of page display names.
    Keyword(String),
}

impl PageSelector {
    /// Builds a keyword selector, trimmed and lowercased.
    #[must_use]
    pub fn keyword(value: impl AsRef<str>) -> Self {
        Self::Keyword(value.as_ref().trim().to_lowercase())
    }

    /// Builds an exact id selector.
    pub fn page_id(value: impl AsRef<str>) -> AppResult<Self> {
        PageId::new(value).map(Self::Id)
    }
}

/// Why a decision has not been reached yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingReason {
    /// No identity has been bound, or the previous one was logged out.
    AwaitingIdentity,
    /// The identity is known but its organisation is not.
    AwaitingOrganisation,
    /// A pass is in flight and reference data has not fully arrived.
    AwaitingReferenceData,
    /// Reference data could not be fetched.
    ReferenceDataUnavailable,
}

impl PendingReason {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingIdentity => "awaiting_identity",
            Self::AwaitingOrganisation => "awaiting_organisation",
            Self::AwaitingReferenceData => "awaiting_reference_data",
            Self::ReferenceDataUnavailable => "reference_data_unavailable",
        }
    }
}

/// Outcome of a page-level authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum AccessDecision {
    /// Not yet determined.
    Pending(PendingReason),
    /// Access granted.
    Allowed,
    /// Access refused.
    Denied,
}

impl AccessDecision {
    /// Maps a boolean check to a terminal decision.
    #[must_use]
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }

    /// Returns whether access is granted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns whether the decision is still open.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending(_) => "pending",
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        }
    }
}
