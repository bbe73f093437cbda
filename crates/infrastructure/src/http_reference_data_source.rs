use async_trait::async_trait;
use constructmate_application::{
    CreatePageInput, CreateRoleInput, OrganisationSummary, ReferenceDataSource, UpdatePageInput,
    UpdateRoleInput,
};
use constructmate_core::{AppResult, BearerToken, OrganisationId};
use constructmate_domain::{Page, Role, RolePageMapping};
use reqwest::Method;
use tracing::debug;

use crate::UpstreamClient;
use crate::payloads::{
    MappingBody, PageBody, RoleBody, parse_mappings, parse_organisation, parse_pages, parse_roles,
};

/// Reference data source backed by the upstream REST API.
#[derive(Debug, Clone)]
pub struct HttpReferenceDataSource {
    upstream: UpstreamClient,
}

impl HttpReferenceDataSource {
    /// Creates a new HTTP reference data source.
    #[must_use]
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ReferenceDataSource for HttpReferenceDataSource {
    async fn list_roles(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Role>> {
        let body = self
            .upstream
            .get_json(
                token,
                "Role/all",
                &[("organisationId", organisation_id.as_str())],
            )
            .await?;
        Ok(parse_roles(body))
    }

    async fn list_pages(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Page>> {
        let body = self
            .upstream
            .get_json(
                token,
                "Page/all",
                &[("organisationId", organisation_id.as_str())],
            )
            .await?;
        Ok(parse_pages(body))
    }

    async fn list_role_page_mappings(
        &self,
        token: &BearerToken,
    ) -> AppResult<Vec<RolePageMapping>> {
        let body = self
            .upstream
            .get_json(token, "RolePageMapping/all", &[])
            .await?;
        Ok(parse_mappings(body))
    }

    async fn find_organisation(
        &self,
        token: &BearerToken,
        email: &str,
    ) -> AppResult<Option<OrganisationSummary>> {
        let body = self
            .upstream
            .get_json(token, "Dashboard/GetDashboardData", &[("emailId", email)])
            .await?;

        let summary = parse_organisation(&body);
        if summary.is_none() {
            debug!("dashboard body carried no organisation id");
        }
        Ok(summary)
    }

    async fn create_role(&self, token: &BearerToken, input: CreateRoleInput) -> AppResult<()> {
        let body = RoleBody {
            role_id: None,
            role_name: &input.name,
            organisation_id: input.organisation_id.as_str(),
        };
        self.upstream
            .send_json(Some(token), Method::POST, "Role/add", &body)
            .await?;
        Ok(())
    }

    async fn update_role(&self, token: &BearerToken, input: UpdateRoleInput) -> AppResult<()> {
        let body = RoleBody {
            role_id: Some(input.role_id.as_str()),
            role_name: &input.name,
            organisation_id: input.organisation_id.as_str(),
        };
        self.upstream
            .send_json(Some(token), Method::PUT, "Role/update", &body)
            .await?;
        Ok(())
    }

    async fn create_page(&self, token: &BearerToken, input: CreatePageInput) -> AppResult<()> {
        let body = PageBody {
            page_id: None,
            page_name: &input.name,
            organisation_id: input.organisation_id.as_str(),
        };
        self.upstream
            .send_json(Some(token), Method::POST, "Page/add", &body)
            .await?;
        Ok(())
    }

    async fn update_page(&self, token: &BearerToken, input: UpdatePageInput) -> AppResult<()> {
        let body = PageBody {
            page_id: Some(input.page_id.as_str()),
            page_name: &input.name,
            organisation_id: input.organisation_id.as_str(),
        };
        self.upstream
            .send_json(Some(token), Method::PUT, "Page/update", &body)
            .await?;
        Ok(())
    }

    async fn replace_role_page_mappings(
        &self,
        token: &BearerToken,
        mappings: Vec<RolePageMapping>,
    ) -> AppResult<()> {
        let body: Vec<MappingBody<'_>> = mappings.iter().map(MappingBody::from_mapping).collect();
        self.upstream
            .send_json(Some(token), Method::POST, "RolePageMapping/save", &body)
            .await?;
        Ok(())
    }
}
