use constructmate_application::{
    MappingGrid, MappingGridRow, MenuLink, NavigationMenu, PageAccess, PermittedPages,
    RouteGuardOutcome,
};
use constructmate_core::UserIdentity;
use constructmate_domain::{AccessDecision, Page, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Name shown when the organisation name is unknown.
pub const DEFAULT_ORGANISATION_NAME: &str = "ConstructMate";

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for credential login.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub display_name: String,
    pub role_name: String,
    pub email: Option<String>,
    pub organisation_id: Option<String>,
    pub organisation_name: String,
}

impl UserIdentityResponse {
    pub fn from_identity(identity: &UserIdentity, organisation_name: Option<String>) -> Self {
        Self {
            display_name: identity.display_name().to_owned(),
            role_name: identity.role_name().to_owned(),
            email: identity.email().map(str::to_owned),
            organisation_id: identity
                .organisation_id()
                .map(|organisation_id| organisation_id.as_str().to_owned()),
            organisation_name: organisation_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ORGANISATION_NAME.to_owned()),
        }
    }
}

/// Single access decision.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-decision-response.ts"
)]
pub struct AccessDecisionResponse {
    pub state: String,
    pub reason: Option<String>,
    pub allowed: bool,
}

impl From<AccessDecision> for AccessDecisionResponse {
    fn from(decision: AccessDecision) -> Self {
        let reason = match decision {
            AccessDecision::Pending(reason) => Some(reason.as_str().to_owned()),
            AccessDecision::Allowed | AccessDecision::Denied => None,
        };

        Self {
            state: decision.as_str().to_owned(),
            reason,
            allowed: decision.is_allowed(),
        }
    }
}

/// Query for a single access decision.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-check-query.ts"
)]
pub struct AccessCheckQuery {
    pub page_id: Option<String>,
    pub keyword: Option<String>,
}

/// Query for the route guard.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/route-guard-query.ts"
)]
pub struct RouteGuardQuery {
    pub path: String,
}

/// Route guard instruction.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/route-guard-response.ts"
)]
pub struct RouteGuardResponse {
    pub action: String,
    pub reason: Option<String>,
    pub target: Option<String>,
}

impl From<RouteGuardOutcome> for RouteGuardResponse {
    fn from(outcome: RouteGuardOutcome) -> Self {
        match outcome {
            RouteGuardOutcome::Render => Self {
                action: "render".to_owned(),
                reason: None,
                target: None,
            },
            RouteGuardOutcome::Wait(reason) => Self {
                action: "wait".to_owned(),
                reason: Some(reason.as_str().to_owned()),
                target: None,
            },
            RouteGuardOutcome::Redirect(target) => Self {
                action: "redirect".to_owned(),
                reason: None,
                target: Some(target.to_owned()),
            },
        }
    }
}

/// Navigation menu link.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/menu-link-response.ts"
)]
pub struct MenuLinkResponse {
    pub path: String,
    pub label: String,
}

impl From<MenuLink> for MenuLinkResponse {
    fn from(link: MenuLink) -> Self {
        Self {
            path: link.path.to_owned(),
            label: link.label.to_owned(),
        }
    }
}

/// Navigation menu state. `links` is empty unless `state` is `ready`.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/navigation-response.ts"
)]
pub struct NavigationResponse {
    pub state: String,
    pub reason: Option<String>,
    pub links: Vec<MenuLinkResponse>,
}

impl From<NavigationMenu> for NavigationResponse {
    fn from(menu: NavigationMenu) -> Self {
        match menu {
            NavigationMenu::Anonymous => Self {
                state: "anonymous".to_owned(),
                reason: None,
                links: Vec::new(),
            },
            NavigationMenu::Pending(reason) => Self {
                state: "pending".to_owned(),
                reason: Some(reason.as_str().to_owned()),
                links: Vec::new(),
            },
            NavigationMenu::Ready(links) => Self {
                state: "ready".to_owned(),
                reason: None,
                links: links.into_iter().map(MenuLinkResponse::from).collect(),
            },
        }
    }
}

/// Pages the session may reach. `page_ids` is empty when `all_pages` is set or the
/// state is not `ready`.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permitted-pages-response.ts"
)]
pub struct PermittedPagesResponse {
    pub state: String,
    pub reason: Option<String>,
    pub all_pages: bool,
    pub page_ids: Vec<String>,
}

impl From<PermittedPages> for PermittedPagesResponse {
    fn from(pages: PermittedPages) -> Self {
        match pages {
            PermittedPages::Anonymous => Self {
                state: "anonymous".to_owned(),
                reason: None,
                all_pages: false,
                page_ids: Vec::new(),
            },
            PermittedPages::Pending(reason) => Self {
                state: "pending".to_owned(),
                reason: Some(reason.as_str().to_owned()),
                all_pages: false,
                page_ids: Vec::new(),
            },
            PermittedPages::Ready(PageAccess::All) => Self {
                state: "ready".to_owned(),
                reason: None,
                all_pages: true,
                page_ids: Vec::new(),
            },
            PermittedPages::Ready(PageAccess::Only(page_ids)) => Self {
                state: "ready".to_owned(),
                reason: None,
                all_pages: false,
                page_ids: page_ids
                    .iter()
                    .map(|page_id| page_id.as_str().to_owned())
                    .collect(),
            },
        }
    }
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    #[ts(type = "number | null")]
    pub rank: Option<i64>,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            role_id: role.id().as_str().to_owned(),
            name: role.name().to_owned(),
            rank: role.rank(),
        }
    }
}

/// API representation of a page.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/page-response.ts"
)]
pub struct PageResponse {
    pub page_id: String,
    pub name: String,
}

impl From<&Page> for PageResponse {
    fn from(page: &Page) -> Self {
        Self {
            page_id: page.id().as_str().to_owned(),
            name: page.name().to_owned(),
        }
    }
}

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
}

/// Incoming payload for role renaming.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub role_id: String,
    pub name: String,
}

/// Incoming payload for page creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-page-request.ts"
)]
pub struct CreatePageRequest {
    pub name: String,
}

/// Incoming payload for page renaming.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-page-request.ts"
)]
pub struct UpdatePageRequest {
    pub page_id: String,
    pub name: String,
}

/// One row of the role/page mapping grid.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/mapping-grid-row-response.ts"
)]
pub struct MappingGridRowResponse {
    pub role: RoleResponse,
    pub page_ids: Vec<String>,
}

impl From<&MappingGridRow> for MappingGridRowResponse {
    fn from(row: &MappingGridRow) -> Self {
        Self {
            role: RoleResponse::from(&row.role),
            page_ids: row
                .page_ids
                .iter()
                .map(|page_id| page_id.as_str().to_owned())
                .collect(),
        }
    }
}

/// Role/page mapping grid.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/mapping-grid-response.ts"
)]
pub struct MappingGridResponse {
    pub pages: Vec<PageResponse>,
    pub rows: Vec<MappingGridRowResponse>,
}

impl From<&MappingGrid> for MappingGridResponse {
    fn from(grid: &MappingGrid) -> Self {
        Self {
            pages: grid.pages.iter().map(PageResponse::from).collect(),
            rows: grid.rows.iter().map(MappingGridRowResponse::from).collect(),
        }
    }
}

/// Requested pages for one role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-page-assignment-request.ts"
)]
pub struct RolePageAssignmentRequest {
    pub role_id: String,
    pub page_ids: Vec<String>,
}

/// Incoming payload for saving the mapping grid.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-mapping-grid-request.ts"
)]
pub struct SaveMappingGridRequest {
    pub rows: Vec<RolePageAssignmentRequest>,
}

/// Generic message response.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/generic-message-response.ts"
)]
pub struct GenericMessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use constructmate_application::{
        MenuLink, NavigationMenu, PageAccess, PermittedPages, RouteGuardOutcome,
    };
    use constructmate_core::{OrganisationId, UserIdentity};
    use constructmate_domain::{AccessDecision, PageId, PendingReason};

    use super::{
        AccessDecisionResponse, NavigationResponse, PermittedPagesResponse, RouteGuardResponse,
        UserIdentityResponse,
    };

    #[test]
    fn pending_decision_carries_reason() {
        let response = AccessDecisionResponse::from(AccessDecision::Pending(
            PendingReason::ReferenceDataUnavailable,
        ));

        assert_eq!(response.state, "pending");
        assert_eq!(
            response.reason.as_deref(),
            Some(PendingReason::ReferenceDataUnavailable.as_str())
        );
        assert!(!response.allowed);
        assert!(AccessDecisionResponse::from(AccessDecision::Allowed).allowed);
    }

    #[test]
    fn redirect_outcome_carries_target() {
        let response = RouteGuardResponse::from(RouteGuardOutcome::Redirect("/unauthorized"));
        assert_eq!(response.action, "redirect");
        assert_eq!(response.target.as_deref(), Some("/unauthorized"));
    }

    #[test]
    fn pending_menu_has_no_links() {
        let response =
            NavigationResponse::from(NavigationMenu::Pending(PendingReason::AwaitingOrganisation));
        assert_eq!(response.state, "pending");
        assert!(response.links.is_empty());

        let response = NavigationResponse::from(NavigationMenu::Ready(vec![MenuLink {
            path: "/home",
            label: "Dashboard",
        }]));
        assert_eq!(response.links.len(), 1);
    }

    #[test]
    fn organisation_name_falls_back_to_product_name() {
        let identity = UserIdentity::new(
            "Sam",
            "Supervisor",
            None,
            Some(OrganisationId::new("7").unwrap_or_else(|_| unreachable!())),
        );

        let response = UserIdentityResponse::from_identity(&identity, None);
        assert_eq!(response.organisation_name, "ConstructMate");
        assert_eq!(response.organisation_id.as_deref(), Some("7"));

        let response =
            UserIdentityResponse::from_identity(&identity, Some("Mason Builders".to_owned()));
        assert_eq!(response.organisation_name, "Mason Builders");
    }

    #[test]
    fn permitted_pages_report_ids_or_all() {
        let only = PermittedPagesResponse::from(PermittedPages::Ready(PageAccess::Only(
            ["12", "7"]
                .into_iter()
                .map(|value| PageId::new(value).unwrap_or_else(|_| unreachable!()))
                .collect(),
        )));
        assert_eq!(only.state, "ready");
        assert!(!only.all_pages);
        assert_eq!(only.page_ids, vec!["12".to_owned(), "7".to_owned()]);

        let all = PermittedPagesResponse::from(PermittedPages::Ready(PageAccess::All));
        assert!(all.all_pages);
        assert!(all.page_ids.is_empty());

        let pending = PermittedPagesResponse::from(PermittedPages::Pending(
            PendingReason::AwaitingOrganisation,
        ));
        assert_eq!(pending.state, "pending");
        assert!(pending.page_ids.is_empty());
    }
}
