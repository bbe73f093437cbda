use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use constructmate_application::{
    CreatePageInput, CreateRoleInput, OrganisationSummary, ReferenceDataSource, UpdatePageInput,
    UpdateRoleInput,
};
use constructmate_core::{AppError, AppResult, BearerToken, OrganisationId};
use constructmate_domain::{Page, PageId, Role, RoleId, RolePageMapping};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::payloads::{parse_mappings, parse_organisation, parse_pages, parse_roles};

#[cfg(test)]
mod tests;

/// Seed document accepted by the in-memory source.
///
/// Rows use the same shapes as the upstream API bodies.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReferenceDataSeed {
    roles: Value,
    pages: Value,
    mappings: Value,
    organisations: Vec<Value>,
}

/// In-memory reference data source for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryReferenceDataSource {
    roles: RwLock<Vec<Role>>,
    pages: RwLock<Vec<Page>>,
    mappings: RwLock<BTreeMap<RoleId, RolePageMapping>>,
    organisations: RwLock<HashMap<String, OrganisationSummary>>,
}

impl InMemoryReferenceDataSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from a JSON seed document.
    pub fn from_seed_json(document: &str) -> AppResult<Self> {
        let seed: ReferenceDataSeed = serde_json::from_str(document).map_err(|error| {
            AppError::Validation(format!("invalid reference data seed: {error}"))
        })?;

        let mut mappings: BTreeMap<RoleId, RolePageMapping> = BTreeMap::new();
        for mapping in parse_mappings(seed.mappings) {
            match mappings.get_mut(mapping.role_id()) {
                Some(existing) => existing.merge(mapping)?,
                None => {
                    mappings.insert(mapping.role_id().clone(), mapping);
                }
            }
        }

        let mut organisations = HashMap::new();
        for row in seed.organisations {
            let email = row
                .get("email")
                .or_else(|| row.get("emailId"))
                .and_then(Value::as_str)
                .map(|email| email.trim().to_lowercase());
            match (email, parse_organisation(&row)) {
                (Some(email), Some(summary)) if !email.is_empty() => {
                    organisations.insert(email, summary);
                }
                _ => warn!("skipping seed organisation without email or organisation id"),
            }
        }

        let source = Self {
            roles: RwLock::new(parse_roles(seed.roles)),
            pages: RwLock::new(parse_pages(seed.pages)),
            mappings: RwLock::new(mappings),
            organisations: RwLock::new(organisations),
        };
        Ok(source)
    }

    /// Reads a JSON seed document from disk.
    pub async fn load_seed(path: &Path) -> AppResult<Self> {
        let document = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to read reference data seed '{}': {error}",
                path.display()
            ))
        })?;

        let source = Self::from_seed_json(&document)?;
        info!(path = %path.display(), "loaded reference data seed");
        Ok(source)
    }

    /// Registers the organisation a user email belongs to.
    pub async fn register_organisation(&self, email: &str, summary: OrganisationSummary) {
        self.organisations
            .write()
            .await
            .insert(email.trim().to_lowercase(), summary);
    }
}

#[async_trait]
impl ReferenceDataSource for InMemoryReferenceDataSource {
    async fn list_roles(
        &self,
        _token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .filter(|role| visible_in(role.organisation_id(), organisation_id))
            .cloned()
            .collect())
    }

    async fn list_pages(
        &self,
        _token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<Vec<Page>> {
        Ok(self
            .pages
            .read()
            .await
            .iter()
            .filter(|page| visible_in(page.organisation_id(), organisation_id))
            .cloned()
            .collect())
    }

    async fn list_role_page_mappings(
        &self,
        _token: &BearerToken,
    ) -> AppResult<Vec<RolePageMapping>> {
        Ok(self.mappings.read().await.values().cloned().collect())
    }

    async fn find_organisation(
        &self,
        _token: &BearerToken,
        email: &str,
    ) -> AppResult<Option<OrganisationSummary>> {
        Ok(self
            .organisations
            .read()
            .await
            .get(&email.trim().to_lowercase())
            .cloned())
    }

    async fn create_role(&self, _token: &BearerToken, input: CreateRoleInput) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let id = RoleId::new(next_id(roles.iter().map(|role| role.id().as_str())))?;
        roles.push(Role::new(id, input.name, Some(input.organisation_id), None)?);
        Ok(())
    }

    async fn update_role(&self, _token: &BearerToken, input: UpdateRoleInput) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let role = roles
            .iter_mut()
            .find(|role| {
                role.id() == &input.role_id
                    && visible_in(role.organisation_id(), &input.organisation_id)
            })
            .ok_or_else(|| AppError::NotFound(format!("role '{}' not found", input.role_id)))?;

        *role = Role::new(
            input.role_id,
            input.name,
            role.organisation_id().cloned(),
            role.rank(),
        )?;
        Ok(())
    }

    async fn create_page(&self, _token: &BearerToken, input: CreatePageInput) -> AppResult<()> {
        let mut pages = self.pages.write().await;
        let id = PageId::new(next_id(pages.iter().map(|page| page.id().as_str())))?;
        pages.push(Page::new(id, input.name, Some(input.organisation_id))?);
        Ok(())
    }

    async fn update_page(&self, _token: &BearerToken, input: UpdatePageInput) -> AppResult<()> {
        let mut pages = self.pages.write().await;
        let page = pages
            .iter_mut()
            .find(|page| {
                page.id() == &input.page_id
                    && visible_in(page.organisation_id(), &input.organisation_id)
            })
            .ok_or_else(|| AppError::NotFound(format!("page '{}' not found", input.page_id)))?;

        *page = Page::new(input.page_id, input.name, page.organisation_id().cloned())?;
        Ok(())
    }

    async fn replace_role_page_mappings(
        &self,
        _token: &BearerToken,
        mappings: Vec<RolePageMapping>,
    ) -> AppResult<()> {
        let mut stored = self.mappings.write().await;
        for mapping in mappings {
            stored.insert(mapping.role_id().clone(), mapping);
        }
        Ok(())
    }
}

fn visible_in(owner: Option<&OrganisationId>, organisation_id: &OrganisationId) -> bool {
    owner.is_none_or(|owner| owner == organisation_id)
}

fn next_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
        .to_string()
}
