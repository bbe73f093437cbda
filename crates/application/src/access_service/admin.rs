use std::collections::{BTreeMap, BTreeSet};

use constructmate_core::NonEmptyString;
use constructmate_domain::{Page, PageId, Role, RoleId, RolePageMapping};

use crate::{CreatePageInput, CreateRoleInput, UpdatePageInput, UpdateRoleInput};

use super::*;

/// One editable row of the role/page mapping grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingGridRow {
    /// Role being edited.
    pub role: Role,
    /// Pages currently mapped to the role.
    pub page_ids: BTreeSet<PageId>,
}

/// Role/page mapping grid for one organisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingGrid {
    /// Grid columns.
    pub pages: Vec<Page>,
    /// Grid rows; privileged roles are excluded.
    pub rows: Vec<MappingGridRow>,
}

/// Requested page set for one role when saving the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePageAssignment {
    /// Role being saved.
    pub role_id: RoleId,
    /// Pages the role may access after saving.
    pub page_ids: Vec<PageId>,
}

impl AccessService {
    /// Lists the roles of the session organisation.
    pub async fn list_roles(&self, session: &AccessSession) -> AppResult<Vec<Role>> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self
            .reference_data
            .list_roles(&token, &organisation_id)
            .await;
        release_rejected(session, outcome).await
    }

    /// Creates a role in the session organisation.
    pub async fn create_role(&self, session: &AccessSession, name: &str) -> AppResult<()> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self.create_role_in(&token, &organisation_id, name).await;
        release_rejected(session, outcome).await
    }

    /// Renames a role of the session organisation.
    pub async fn update_role(
        &self,
        session: &AccessSession,
        role_id: RoleId,
        name: &str,
    ) -> AppResult<()> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self
            .update_role_in(&token, &organisation_id, role_id, name)
            .await;
        release_rejected(session, outcome).await
    }

    /// Lists the pages of the session organisation.
    pub async fn list_pages(&self, session: &AccessSession) -> AppResult<Vec<Page>> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self
            .reference_data
            .list_pages(&token, &organisation_id)
            .await;
        release_rejected(session, outcome).await
    }

    /// Creates a page in the session organisation.
    pub async fn create_page(&self, session: &AccessSession, name: &str) -> AppResult<()> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self.create_page_in(&token, &organisation_id, name).await;
        release_rejected(session, outcome).await
    }

    /// Renames a page of the session organisation.
    pub async fn update_page(
        &self,
        session: &AccessSession,
        page_id: PageId,
        name: &str,
    ) -> AppResult<()> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self
            .update_page_in(&token, &organisation_id, page_id, name)
            .await;
        release_rejected(session, outcome).await
    }

    /// Builds the role/page mapping grid of the session organisation.
    pub async fn mapping_grid(&self, session: &AccessSession) -> AppResult<MappingGrid> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self.mapping_grid_in(&token, &organisation_id).await;
        release_rejected(session, outcome).await
    }

    /// Replaces the mapping rows of the submitted roles.
    ///
    /// Every role must be a non-privileged role of the organisation and every page
    /// must be on the organisation's page roster.
    pub async fn save_mapping_grid(
        &self,
        session: &AccessSession,
        assignments: Vec<RolePageAssignment>,
    ) -> AppResult<()> {
        let (token, organisation_id) = require_organisation(session).await?;
        let outcome = self
            .save_mapping_grid_in(&token, &organisation_id, assignments)
            .await;
        release_rejected(session, outcome).await
    }

    async fn create_role_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
        name: &str,
    ) -> AppResult<()> {
        let name = NonEmptyString::trimmed(name)?;

        let roles = self.reference_data.list_roles(token, organisation_id).await?;
        if roles.iter().any(|role| role.matches_name(name.as_str())) {
            return Err(AppError::Conflict(format!(
                "role '{name}' already exists in organisation '{organisation_id}'"
            )));
        }

        self.reference_data
            .create_role(
                token,
                CreateRoleInput {
                    organisation_id: organisation_id.clone(),
                    name: name.into(),
                },
            )
            .await?;
        info!(organisation_id = %organisation_id, "role created");
        Ok(())
    }

    async fn update_role_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
        role_id: RoleId,
        name: &str,
    ) -> AppResult<()> {
        let name = NonEmptyString::trimmed(name)?;

        let roles = self.reference_data.list_roles(token, organisation_id).await?;
        if !roles.iter().any(|role| role.id() == &role_id) {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist in organisation '{organisation_id}'"
            )));
        }
        if roles
            .iter()
            .any(|role| role.id() != &role_id && role.matches_name(name.as_str()))
        {
            return Err(AppError::Conflict(format!(
                "role '{name}' already exists in organisation '{organisation_id}'"
            )));
        }

        self.reference_data
            .update_role(
                token,
                UpdateRoleInput {
                    role_id,
                    organisation_id: organisation_id.clone(),
                    name: name.into(),
                },
            )
            .await
    }

    async fn create_page_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
        name: &str,
    ) -> AppResult<()> {
        let name = NonEmptyString::trimmed(name)?;

        let pages = self.reference_data.list_pages(token, organisation_id).await?;
        if pages
            .iter()
            .any(|page| page.name().eq_ignore_ascii_case(name.as_str()))
        {
            return Err(AppError::Conflict(format!(
                "page '{name}' already exists in organisation '{organisation_id}'"
            )));
        }

        self.reference_data
            .create_page(
                token,
                CreatePageInput {
                    organisation_id: organisation_id.clone(),
                    name: name.into(),
                },
            )
            .await?;
        info!(organisation_id = %organisation_id, "page created");
        Ok(())
    }

    async fn update_page_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
        page_id: PageId,
        name: &str,
    ) -> AppResult<()> {
        let name = NonEmptyString::trimmed(name)?;

        let pages = self.reference_data.list_pages(token, organisation_id).await?;
        if !pages.iter().any(|page| page.id() == &page_id) {
            return Err(AppError::NotFound(format!(
                "page '{page_id}' does not exist in organisation '{organisation_id}'"
            )));
        }

        self.reference_data
            .update_page(
                token,
                UpdatePageInput {
                    page_id,
                    organisation_id: organisation_id.clone(),
                    name: name.into(),
                },
            )
            .await
    }

    async fn mapping_grid_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<MappingGrid> {
        let snapshot = self.load_snapshot(token, organisation_id).await?;

        let mut mapped: BTreeMap<RoleId, BTreeSet<PageId>> = BTreeMap::new();
        for mapping in snapshot.mappings {
            mapped
                .entry(mapping.role_id().clone())
                .or_default()
                .extend(mapping.page_ids().iter().cloned());
        }

        let rows = snapshot
            .roles
            .into_iter()
            .filter(|role| !role.is_privileged())
            .map(|role| MappingGridRow {
                page_ids: mapped.remove(role.id()).unwrap_or_default(),
                role,
            })
            .collect();

        Ok(MappingGrid {
            pages: snapshot.pages,
            rows,
        })
    }

    async fn save_mapping_grid_in(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
        assignments: Vec<RolePageAssignment>,
    ) -> AppResult<()> {
        let (roles, pages) = tokio::try_join!(
            self.reference_data.list_roles(token, organisation_id),
            self.reference_data.list_pages(token, organisation_id),
        )?;

        let known_page_ids: BTreeSet<&PageId> = pages.iter().map(Page::id).collect();
        let mut mappings: BTreeMap<RoleId, RolePageMapping> = BTreeMap::new();

        for assignment in assignments {
            let role = roles
                .iter()
                .find(|role| role.id() == &assignment.role_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "role '{}' does not exist in organisation '{organisation_id}'",
                        assignment.role_id
                    ))
                })?;
            if role.is_privileged() {
                return Err(AppError::Validation(format!(
                    "role '{}' has implicit access to every page and cannot be mapped",
                    role.name()
                )));
            }

            if let Some(unknown) = assignment
                .page_ids
                .iter()
                .find(|page_id| !known_page_ids.contains(page_id))
            {
                return Err(AppError::Validation(format!(
                    "page '{unknown}' does not exist in organisation '{organisation_id}'"
                )));
            }

            let row = RolePageMapping::new(assignment.role_id.clone(), assignment.page_ids);
            match mappings.get_mut(&assignment.role_id) {
                Some(existing) => existing.merge(row)?,
                None => {
                    mappings.insert(assignment.role_id, row);
                }
            }
        }

        let mapping_count = mappings.len();
        self.reference_data
            .replace_role_page_mappings(token, mappings.into_values().collect())
            .await?;

        info!(
            organisation_id = %organisation_id,
            roles = mapping_count,
            "role page mappings replaced"
        );
        Ok(())
    }
}

async fn require_organisation(
    session: &AccessSession,
) -> AppResult<(BearerToken, OrganisationId)> {
    let (token, identity) = session
        .credential()
        .await
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let organisation_id = identity.organisation_id().cloned().ok_or_else(|| {
        AppError::Forbidden("session organisation has not been resolved".to_owned())
    })?;

    Ok((token, organisation_id))
}
