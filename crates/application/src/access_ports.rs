use async_trait::async_trait;
use constructmate_core::{AppResult, BearerToken, OrganisationId};
use constructmate_domain::{Page, PageId, Role, RoleId, RolePageMapping};

/// Organisation resolved from a user's email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganisationSummary {
    /// Organisation identifier.
    pub organisation_id: OrganisationId,
    /// Organisation display name, when the directory provided one.
    pub organisation_name: Option<String>,
}

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Owning organisation.
    pub organisation_id: OrganisationId,
    /// Role display name.
    pub name: String,
}

/// Input payload for role renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// Role being renamed.
    pub role_id: RoleId,
    /// Owning organisation.
    pub organisation_id: OrganisationId,
    /// New display name.
    pub name: String,
}

/// Input payload for page creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePageInput {
    /// Owning organisation.
    pub organisation_id: OrganisationId,
    /// Page display name.
    pub name: String,
}

/// Input payload for page renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePageInput {
    /// Page being renamed.
    pub page_id: PageId,
    /// Owning organisation.
    pub organisation_id: OrganisationId,
    /// New display name.
    pub name: String,
}

/// Reference data backing page-level authorization.
///
/// Implementations normalise payload variance before returning domain values.
#[async_trait]
pub trait ReferenceDataSource: Send + Sync {
    /// Lists the roles of an organisation.
    async fn list_roles(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Role>>;

    /// Lists the pages of an organisation.
    async fn list_pages(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Page>>;

    /// Lists every role/page mapping row.
    async fn list_role_page_mappings(&self, token: &BearerToken)
    -> AppResult<Vec<RolePageMapping>>;

    /// Resolves the organisation a user belongs to.
    async fn find_organisation(
        &self,
        token: &BearerToken,
        email: &str,
    ) -> AppResult<Option<OrganisationSummary>>;

    /// Creates a role.
    async fn create_role(&self, token: &BearerToken, input: CreateRoleInput) -> AppResult<()>;

    /// Renames a role.
    async fn update_role(&self, token: &BearerToken, input: UpdateRoleInput) -> AppResult<()>;

    /// Creates a page.
    async fn create_page(&self, token: &BearerToken, input: CreatePageInput) -> AppResult<()>;

    /// Renames a page.
    async fn update_page(&self, token: &BearerToken, input: UpdatePageInput) -> AppResult<()>;

    /// Replaces the mapping rows of the given roles.
    async fn replace_role_page_mappings(
        &self,
        token: &BearerToken,
        mappings: Vec<RolePageMapping>,
    ) -> AppResult<()>;
}

/// Result of a credential exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The identity endpoint issued a credential.
    Issued(BearerToken),
    /// The identity endpoint refused the credentials.
    Rejected(String),
}

/// Port exchanging user credentials for a bearer token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Exchanges a user name and password for a credential.
    async fn login(&self, user_name: &str, password: &str) -> AppResult<LoginOutcome>;
}
