use constructmate_domain::{
    LOGIN_PATH, PendingReason, RouteKind, UNAUTHORIZED_PATH, classify_route,
};

use super::*;

/// What a route guard should do with a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuardOutcome {
    /// Render the nested content.
    Render,
    /// Render nothing until access is decided.
    Wait(PendingReason),
    /// Navigate to a fixed destination instead.
    Redirect(&'static str),
}

impl AccessService {
    /// Applies the route guard to a navigation target.
    pub async fn guard_route(&self, session: &AccessSession, path: &str) -> RouteGuardOutcome {
        match classify_route(path) {
            RouteKind::Public => RouteGuardOutcome::Render,
            RouteKind::Authenticated | RouteKind::Unknown => {
                if session.identity().await.is_some() {
                    RouteGuardOutcome::Render
                } else {
                    RouteGuardOutcome::Redirect(LOGIN_PATH)
                }
            }
            RouteKind::Guarded(section) => self.guard_section(session, section.page_keyword).await,
        }
    }

    /// Applies the route guard for a page keyword.
    pub async fn guard_section(
        &self,
        session: &AccessSession,
        page_keyword: &str,
    ) -> RouteGuardOutcome {
        if self.run_pass(session).await == PassStatus::Anonymous {
            return RouteGuardOutcome::Redirect(LOGIN_PATH);
        }

        match session
            .gate()
            .decide(&PageSelector::keyword(page_keyword))
            .await
        {
            AccessDecision::Allowed => RouteGuardOutcome::Render,
            AccessDecision::Pending(reason) => RouteGuardOutcome::Wait(reason),
            AccessDecision::Denied => {
                info!(page_keyword, "navigation denied");
                RouteGuardOutcome::Redirect(UNAUTHORIZED_PATH)
            }
        }
    }
}
