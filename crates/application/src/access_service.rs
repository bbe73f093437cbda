use std::sync::Arc;

use constructmate_core::{AppError, AppResult, BearerToken, OrganisationId};
use constructmate_domain::{AccessDecision, PageSelector, is_admin_role_name};
use tracing::{debug, info, warn};

use crate::{AccessContext, AccessSession, AccessSnapshot, ReferenceDataSource};

mod admin;
mod guard;
mod navigation;


pub use admin::{MappingGrid, MappingGridRow, RolePageAssignment};
pub use guard::RouteGuardOutcome;
pub use navigation::{MenuLink, NavigationMenu, PermittedPages};

/// Application service resolving page-level access for sessions.
#[derive(Clone)]
pub struct AccessService {
    reference_data: Arc<dyn ReferenceDataSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassStatus {
    Anonymous,
    Completed,
}

impl AccessService {
    /// Creates a new access service from a reference data source.
    #[must_use]
    pub fn new(reference_data: Arc<dyn ReferenceDataSource>) -> Self {
        Self { reference_data }
    }

    /// Fetches roles, pages and mappings concurrently and joins them into one snapshot.
    ///
    /// Fails as a whole when any of the three fetches fails; partial data never escapes.
    pub async fn load_snapshot(
        &self,
        token: &BearerToken,
        organisation_id: &OrganisationId,
    ) -> AppResult<AccessSnapshot> {
        let (roles, pages, mappings) = tokio::try_join!(
            self.reference_data.list_roles(token, organisation_id),
            self.reference_data.list_pages(token, organisation_id),
            self.reference_data.list_role_page_mappings(token),
        )
        .map_err(|error| match error {
            AppError::Unauthorized(message) => AppError::Unauthorized(message),
            other => AppError::Unavailable(format!(
                "access reference data for organisation '{organisation_id}' is unavailable: {other}"
            )),
        })?;

        debug!(
            organisation_id = %organisation_id,
            roles = roles.len(),
            pages = pages.len(),
            mappings = mappings.len(),
            "loaded access snapshot"
        );

        Ok(AccessSnapshot {
            roles,
            pages,
            mappings,
        })
    }

    /// Runs a resolution pass for the session and decides one page.
    ///
    /// Sessions without an identity are denied. Missing organisation or unavailable
    /// reference data leave the decision pending.
    pub async fn evaluate(
        &self,
        session: &AccessSession,
        selector: &PageSelector,
    ) -> AccessDecision {
        match self.run_pass(session).await {
            PassStatus::Anonymous => AccessDecision::Denied,
            PassStatus::Completed => {
                let decision = session.gate().decide(selector).await;
                debug!(decision = decision.as_str(), selector = ?selector, "access evaluated");
                decision
            }
        }
    }

    async fn run_pass(&self, session: &AccessSession) -> PassStatus {
        let Some((token, identity)) = session.credential().await else {
            return PassStatus::Anonymous;
        };

        let ticket = session
            .gate()
            .begin(AccessContext::from_identity(&identity))
            .await;

        let Some(organisation_id) = identity.organisation_id() else {
            debug!("organisation not resolved yet; access stays pending");
            return PassStatus::Completed;
        };

        if is_admin_role_name(identity.role_name()) {
            session.gate().grant_all(ticket).await;
            return PassStatus::Completed;
        }

        match self.load_snapshot(&token, organisation_id).await {
            Err(AppError::Unauthorized(message)) => {
                log_out_rejected(session, &message).await;
                PassStatus::Anonymous
            }
            outcome => {
                if session.gate().complete(ticket, outcome).await {
                    info!(
                        organisation_id = %organisation_id,
                        role_name = %identity.role_name(),
                        generation = ticket.generation(),
                        "access pass resolved"
                    );
                }
                PassStatus::Completed
            }
        }
    }
}

async fn log_out_rejected(session: &AccessSession, message: &str) {
    warn!(error = %message, "upstream rejected session credential; logging out");
    session.logout().await;
}

/// Logs the session out when the upstream rejected its credential.
async fn release_rejected<T>(session: &AccessSession, outcome: AppResult<T>) -> AppResult<T> {
    if let Err(AppError::Unauthorized(message)) = &outcome {
        log_out_rejected(session, message).await;
    }
    outcome
}
