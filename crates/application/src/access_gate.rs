use std::sync::Arc;

use constructmate_core::{AppResult, OrganisationId, UserIdentity};
use constructmate_domain::{AccessDecision, PageSelector, PendingReason};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{AccessResolver, AccessSnapshot, PageAccess};

/// Identity facts a resolution pass depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    role_name: String,
    organisation_id: Option<OrganisationId>,
}

impl AccessContext {
    /// Captures the role and organisation of an identity.
    #[must_use]
    pub fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            role_name: identity.role_name().trim().to_owned(),
            organisation_id: identity.organisation_id().cloned(),
        }
    }

    /// Returns the role name the pass resolves for.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns the organisation the pass resolves in.
    #[must_use]
    pub fn organisation_id(&self) -> Option<&OrganisationId> {
        self.organisation_id.as_ref()
    }
}

/// Handle for one in-flight resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct GateTicket {
    generation: u64,
}

impl GateTicket {
    /// Returns the pass generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
enum GatePhase {
    Pending(PendingReason),
    Unrestricted,
    Resolved(Arc<AccessResolver>),
}

#[derive(Debug)]
struct GateState {
    generation: u64,
    context: Option<AccessContext>,
    phase: GatePhase,
}

/// Per-session access state machine.
///
/// Every pass starts in `PENDING` and moves to a resolved state only when its
/// snapshot arrives while it is still the latest pass. Completions from superseded
/// passes are dropped.
#[derive(Debug)]
pub struct AccessGate {
    state: RwLock<GateState>,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessGate {
    /// Creates a gate with no bound identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GateState {
                generation: 0,
                context: None,
                phase: GatePhase::Pending(PendingReason::AwaitingIdentity),
            }),
        }
    }

    /// Starts a new pass, superseding any pass still in flight.
    ///
    /// A changed context returns the gate to `PENDING`. A pass for the unchanged context
    /// keeps the resolved state readable until its own snapshot arrives.
    pub async fn begin(&self, context: AccessContext) -> GateTicket {
        let mut state = self.state.write().await;
        state.generation = state.generation.saturating_add(1);

        let refreshing = state.context.as_ref() == Some(&context)
            && matches!(
                state.phase,
                GatePhase::Unrestricted | GatePhase::Resolved(_)
            );
        if !refreshing {
            state.phase = GatePhase::Pending(if context.organisation_id.is_some() {
                PendingReason::AwaitingReferenceData
            } else {
                PendingReason::AwaitingOrganisation
            });
            state.context = Some(context);
        }

        GateTicket {
            generation: state.generation,
        }
    }

    /// Completes a pass with its fetched snapshot.
    ///
    /// Returns `false` when the ticket was superseded and nothing changed.
    pub async fn complete(&self, ticket: GateTicket, outcome: AppResult<AccessSnapshot>) -> bool {
        let mut state = self.state.write().await;
        if state.generation != ticket.generation {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = state.generation,
                "dropping superseded access resolution"
            );
            return false;
        }

        state.phase = match outcome {
            Ok(snapshot) => GatePhase::Resolved(Arc::new(AccessResolver::new(snapshot))),
            Err(error) => {
                warn!(error = %error, "access reference data unavailable");
                GatePhase::Pending(PendingReason::ReferenceDataUnavailable)
            }
        };
        true
    }

    /// Completes a pass that needs no reference data because of the admin bypass.
    pub async fn grant_all(&self, ticket: GateTicket) -> bool {
        let mut state = self.state.write().await;
        if state.generation != ticket.generation {
            return false;
        }

        state.phase = GatePhase::Unrestricted;
        true
    }

    /// Drops the bound identity and any resolved state.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.generation = state.generation.saturating_add(1);
        state.context = None;
        state.phase = GatePhase::Pending(PendingReason::AwaitingIdentity);
    }

    /// Reads the decision for a page under the current state.
    pub async fn decide(&self, selector: &PageSelector) -> AccessDecision {
        let state = self.state.read().await;
        match (&state.phase, &state.context) {
            (GatePhase::Pending(reason), _) => AccessDecision::Pending(*reason),
            (GatePhase::Unrestricted, _) => AccessDecision::Allowed,
            (GatePhase::Resolved(resolver), Some(context)) => {
                resolver.resolve(context.role_name(), selector)
            }
            (GatePhase::Resolved(_), None) => {
                AccessDecision::Pending(PendingReason::AwaitingIdentity)
            }
        }
    }

    /// Reads the pages the bound role may reach under the current state.
    pub async fn page_access(&self) -> Result<PageAccess, PendingReason> {
        let state = self.state.read().await;
        match (&state.phase, &state.context) {
            (GatePhase::Pending(reason), _) => Err(*reason),
            (GatePhase::Unrestricted, _) => Ok(PageAccess::All),
            (GatePhase::Resolved(resolver), Some(context)) => {
                Ok(resolver.page_access(context.role_name()))
            }
            (GatePhase::Resolved(_), None) => Err(PendingReason::AwaitingIdentity),
        }
    }
}

#[cfg(test)]
mod tests {
    use constructmate_core::{AppError, OrganisationId, UserIdentity};
    use constructmate_domain::{
        AccessDecision, Page, PageId, PageSelector, PendingReason, Role, RoleId, RolePageMapping,
    };

    use super::{AccessContext, AccessGate};
    use crate::{AccessSnapshot, PageAccess};

    fn supervisor_context(organisation: Option<&str>) -> AccessContext {
        AccessContext::from_identity(&UserIdentity::new(
            "Sam",
            "supervisor",
            None,
            organisation.map(|value| OrganisationId::new(value).unwrap_or_else(|_| unreachable!())),
        ))
    }

    fn snapshot(mapped_pages: &[&str]) -> AccessSnapshot {
        let page_id = |value: &str| PageId::new(value).unwrap_or_else(|_| unreachable!());
        let role_id = RoleId::new("r1").unwrap_or_else(|_| unreachable!());
        AccessSnapshot {
            roles: vec![
                Role::new(role_id.clone(), "Supervisor", None, None)
                    .unwrap_or_else(|_| unreachable!()),
            ],
            pages: vec![
                Page::new(page_id("p1"), "Site Management", None)
                    .unwrap_or_else(|_| unreachable!()),
                Page::new(page_id("p2"), "Employee Management", None)
                    .unwrap_or_else(|_| unreachable!()),
            ],
            mappings: vec![RolePageMapping::new(
                role_id,
                mapped_pages.iter().map(|value| page_id(value)),
            )],
        }
    }

    #[tokio::test]
    async fn new_gate_is_pending() {
        let gate = AccessGate::new();
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingIdentity)
        );
    }

    #[tokio::test]
    async fn pass_is_pending_until_completed() {
        let gate = AccessGate::new();
        let ticket = gate.begin(supervisor_context(Some("org1"))).await;

        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingReferenceData)
        );

        assert!(gate.complete(ticket, Ok(snapshot(&["p1"]))).await);
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Allowed
        );
        assert_eq!(
            gate.decide(&PageSelector::keyword("employee")).await,
            AccessDecision::Denied
        );
    }

    #[tokio::test]
    async fn missing_organisation_reports_pending() {
        let gate = AccessGate::new();
        let _ticket = gate.begin(supervisor_context(None)).await;

        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingOrganisation)
        );
    }

    #[tokio::test]
    async fn late_completion_does_not_overwrite_newer_pass() {
        let gate = AccessGate::new();
        let stale = gate.begin(supervisor_context(Some("org1"))).await;
        let current = gate.begin(supervisor_context(Some("org2"))).await;

        assert!(!gate.complete(stale, Ok(snapshot(&["p1", "p2"]))).await);
        assert!(
            gate.decide(&PageSelector::keyword("site"))
                .await
                .is_pending()
        );

        assert!(gate.complete(current, Ok(snapshot(&[]))).await);
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Denied
        );
    }

    #[tokio::test]
    async fn fetch_failure_stays_pending() {
        let gate = AccessGate::new();
        let ticket = gate.begin(supervisor_context(Some("org1"))).await;

        assert!(
            gate.complete(
                ticket,
                Err(AppError::Unavailable("roles endpoint down".to_owned()))
            )
            .await
        );
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::ReferenceDataUnavailable)
        );
    }

    #[tokio::test]
    async fn invalidate_resets_resolved_state() {
        let gate = AccessGate::new();
        let ticket = gate.begin(supervisor_context(Some("org1"))).await;
        assert!(gate.grant_all(ticket).await);
        assert!(
            gate.decide(&PageSelector::keyword("site"))
                .await
                .is_allowed()
        );

        gate.invalidate().await;
        assert!(!gate.grant_all(ticket).await);
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingIdentity)
        );
    }

    #[tokio::test]
    async fn refresh_for_same_context_keeps_resolved_state() {
        let gate = AccessGate::new();
        let first = gate.begin(supervisor_context(Some("org1"))).await;
        assert!(gate.complete(first, Ok(snapshot(&["p1"]))).await);

        let earlier = gate.begin(supervisor_context(Some("org1"))).await;
        let later = gate.begin(supervisor_context(Some("org1"))).await;
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Allowed
        );

        assert!(gate.complete(later, Ok(snapshot(&["p1", "p2"]))).await);
        assert!(!gate.complete(earlier, Ok(snapshot(&[]))).await);
        assert_eq!(
            gate.decide(&PageSelector::keyword("employee")).await,
            AccessDecision::Allowed
        );
    }

    #[tokio::test]
    async fn changed_context_returns_to_pending() {
        let gate = AccessGate::new();
        let ticket = gate.begin(supervisor_context(Some("org1"))).await;
        assert!(gate.complete(ticket, Ok(snapshot(&["p1"]))).await);

        let _ticket = gate.begin(supervisor_context(Some("org2"))).await;
        assert_eq!(
            gate.decide(&PageSelector::keyword("site")).await,
            AccessDecision::Pending(PendingReason::AwaitingReferenceData)
        );
    }

    #[tokio::test]
    async fn page_access_follows_gate_state() {
        let gate = AccessGate::new();
        assert_eq!(
            gate.page_access().await,
            Err(PendingReason::AwaitingIdentity)
        );

        let ticket = gate.begin(supervisor_context(Some("org1"))).await;
        assert!(gate.complete(ticket, Ok(snapshot(&["p1"]))).await);
        assert_eq!(
            gate.page_access().await,
            Ok(PageAccess::Only(
                [PageId::new("p1").unwrap_or_else(|_| unreachable!())].into()
            ))
        );

        let ticket = gate.begin(supervisor_context(Some("org1"))).await;
        gate.invalidate().await;
        assert!(!gate.grant_all(ticket).await);
        assert!(gate.page_access().await.is_err());
    }
}
