use std::collections::{BTreeSet, HashMap};

use constructmate_domain::{
    AccessDecision, Page, PageId, PageSelector, Role, RoleId, RolePageMapping, is_admin_role_name,
};


/// Reference data captured for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSnapshot {
    /// Organisation roles in server order.
    pub roles: Vec<Role>,
    /// Organisation pages in server order.
    pub pages: Vec<Page>,
    /// Raw mapping rows, possibly several per role.
    pub mappings: Vec<RolePageMapping>,
}

/// Pages a role name may reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAccess {
    /// Every page, through the admin bypass.
    All,
    /// Only the listed pages.
    Only(BTreeSet<PageId>),
}

/// Page-level authorization over one snapshot.
///
/// The resolver is a pure function of the snapshot: it holds no state beyond the
/// normalised role to page table and answers identically for identical questions.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    roles: Vec<Role>,
    pages: Vec<Page>,
    role_to_page_ids: HashMap<RoleId, BTreeSet<PageId>>,
}

impl AccessResolver {
    /// Normalises the snapshot into a role keyed permission table.
    #[must_use]
    pub fn new(snapshot: AccessSnapshot) -> Self {
        let mut role_to_page_ids: HashMap<RoleId, BTreeSet<PageId>> = HashMap::new();
        for mapping in snapshot.mappings {
            role_to_page_ids
                .entry(mapping.role_id().clone())
                .or_default()
                .extend(mapping.page_ids().iter().cloned());
        }

        Self {
            roles: snapshot.roles,
            pages: snapshot.pages,
            role_to_page_ids,
        }
    }

    /// Returns the role record matching a role name, ignoring case and padding.
    #[must_use]
    pub fn matched_role(&self, role_name: &str) -> Option<&Role> {
        self.roles.iter().find(|role| role.matches_name(role_name))
    }

    /// Returns the pages a role name may reach.
    #[must_use]
    pub fn page_access(&self, role_name: &str) -> PageAccess {
        if is_admin_role_name(role_name) {
            return PageAccess::All;
        }

        PageAccess::Only(
            self.matched_role(role_name)
                .and_then(|role| self.role_to_page_ids.get(role.id()))
                .cloned()
                .unwrap_or_default(),
        )
    }

    /// Decides whether a role name may reach the selected page.
    ///
    /// Never returns [`AccessDecision::Pending`].
    #[must_use]
    pub fn resolve(&self, role_name: &str, selector: &PageSelector) -> AccessDecision {
        if is_admin_role_name(role_name) {
            return AccessDecision::Allowed;
        }

        let Some(role) = self.matched_role(role_name) else {
            return AccessDecision::Denied;
        };

        let Some(allowed_page_ids) = self.role_to_page_ids.get(role.id()) else {
            return AccessDecision::Denied;
        };

        match selector {
            PageSelector::Id(page_id) => {
                AccessDecision::from_allowed(allowed_page_ids.contains(page_id))
            }
            PageSelector::Keyword(keyword) => {
                let keyword = keyword.trim().to_lowercase();
                let mut matching_page_ids = self
                    .pages
                    .iter()
                    .filter(|page| page.name_contains(keyword.as_str()))
                    .map(Page::id)
                    .peekable();

                if matching_page_ids.peek().is_none() {
                    return AccessDecision::Denied;
                }

                AccessDecision::from_allowed(
                    matching_page_ids.any(|page_id| allowed_page_ids.contains(page_id)),
                )
            }
        }
    }
}
