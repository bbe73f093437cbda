use constructmate_domain::{DASHBOARD_PATH, PendingReason, SECTIONS};

use super::*;
use crate::PageAccess;

/// Menu entry the current identity may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLink {
    /// Route path.
    pub path: &'static str,
    /// Menu label.
    pub label: &'static str,
}

/// Navigation menu state for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationMenu {
    /// No identity is bound to the session.
    Anonymous,
    /// Access is not decided yet; nothing should be rendered.
    Pending(PendingReason),
    /// Links the identity may follow, in menu order.
    Ready(Vec<MenuLink>),
}

/// Pages a session may reach, as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermittedPages {
    /// No identity is bound to the session.
    Anonymous,
    /// Access is not decided yet.
    Pending(PendingReason),
    /// Access is decided for every page.
    Ready(PageAccess),
}

impl AccessService {
    /// Builds the navigation menu from one resolution pass.
    pub async fn navigation(&self, session: &AccessSession) -> NavigationMenu {
        if self.run_pass(session).await == PassStatus::Anonymous {
            return NavigationMenu::Anonymous;
        }

        let mut links = vec![MenuLink {
            path: DASHBOARD_PATH,
            label: "Dashboard",
        }];

        for section in SECTIONS {
            match session
                .gate()
                .decide(&PageSelector::keyword(section.page_keyword))
                .await
            {
                AccessDecision::Pending(reason) => return NavigationMenu::Pending(reason),
                AccessDecision::Allowed => links.push(MenuLink {
                    path: section.path,
                    label: section.label,
                }),
                AccessDecision::Denied => {}
            }
        }

        NavigationMenu::Ready(links)
    }

    /// Lists the pages the session identity may reach after one resolution pass.
    pub async fn permitted_pages(&self, session: &AccessSession) -> PermittedPages {
        if self.run_pass(session).await == PassStatus::Anonymous {
            return PermittedPages::Anonymous;
        }

        match session.gate().page_access().await {
            Ok(access) => PermittedPages::Ready(access),
            Err(reason) => PermittedPages::Pending(reason),
        }
    }
}
