use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::OrganisationId;

/// Opaque bearer credential issued by the upstream identity endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw credential, stripping an optional `Bearer ` prefix.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        let raw = trimmed
            .strip_prefix("Bearer ")
            .or_else(|| trimmed.strip_prefix("bearer "))
            .unwrap_or(trimmed);

        Self(raw.trim().to_owned())
    }

    /// Returns the raw credential for transport headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the credential carries no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for BearerToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("BearerToken(<redacted>)")
    }
}

/// User information decoded from the bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    display_name: String,
    role_name: String,
    email: Option<String>,
    organisation_id: Option<OrganisationId>,
}

impl UserIdentity {
    /// Creates a user identity from decoded credential claims.
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        role_name: impl Into<String>,
        email: Option<String>,
        organisation_id: Option<OrganisationId>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            role_name: role_name.into(),
            email,
            organisation_id,
        }
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the role name claim as issued, which may be empty.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns the email, if the credential carried one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the organisation linked to the identity, once known.
    #[must_use]
    pub fn organisation_id(&self) -> Option<&OrganisationId> {
        self.organisation_id.as_ref()
    }

    /// Returns a copy of the identity bound to the given organisation.
    #[must_use]
    pub fn with_organisation(mut self, organisation_id: OrganisationId) -> Self {
        self.organisation_id = Some(organisation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::BearerToken;

    #[test]
    fn bearer_token_strips_scheme_prefix() {
        let token = BearerToken::new("Bearer abc.def.ghi");
        assert_eq!(token.expose(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_debug_is_redacted() {
        let token = BearerToken::new("secret-value");
        assert!(!format!("{token:?}").contains("secret-value"));
    }
}
