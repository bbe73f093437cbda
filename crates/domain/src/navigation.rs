//! Fixed catalog of navigable sections and the routes around them.

use serde::Serialize;

/// Route shown to unauthenticated visitors.
pub const LOGIN_PATH: &str = "/";
/// Route every denied navigation is redirected to.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
/// Landing route for any authenticated user.
pub const DASHBOARD_PATH: &str = "/home";

const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH, "/login", "/register", UNAUTHORIZED_PATH];

/// Guarded application section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Route path of the section.
    pub path: &'static str,
    /// Menu label.
    pub label: &'static str,
    /// Keyword matched against page display names.
    pub page_keyword: &'static str,
}

/// All guarded sections in menu order.
pub const SECTIONS: &[Section] = &[
    Section {
        path: "/RoleManagement",
        label: "Role Management",
        page_keyword: "role",
    },
    Section {
        path: "/ManageRoles",
        label: "Manage Roles",
        page_keyword: "role",
    },
    Section {
        path: "/ManagePages",
        label: "Manage Pages",
        page_keyword: "role",
    },
    Section {
        path: "/sites",
        label: "Site Management",
        page_keyword: "site",
    },
    Section {
        path: "/site-transactions",
        label: "Site Transactions",
        page_keyword: "site",
    },
    Section {
        path: "/employees",
        label: "Employees",
        page_keyword: "employee",
    },
    Section {
        path: "/attendance",
        label: "Attendance",
        page_keyword: "attendance",
    },
    Section {
        path: "/labour-payments",
        label: "Labour Payments",
        page_keyword: "labour",
    },
    Section {
        path: "/generate-receipt",
        label: "Generate Receipt",
        page_keyword: "receipt",
    },
    Section {
        path: "/suppliers/create",
        label: "Suppliers",
        page_keyword: "supplier",
    },
    Section {
        path: "/materials/create",
        label: "Materials",
        page_keyword: "material",
    },
];

/// How a route is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Reachable without a credential.
    Public,
    /// Reachable by any authenticated user.
    Authenticated,
    /// Gated by the role/page mapping.
    Guarded(&'static Section),
    /// Not part of the catalog.
    Unknown,
}

/// Classifies a route path, ignoring case and trailing slashes.
#[must_use]
pub fn classify_route(path: &str) -> RouteKind {
    let trimmed = path.trim();
    let normalized = match trimmed.trim_end_matches('/') {
        "" => LOGIN_PATH,
        value => value,
    };

    if PUBLIC_PATHS
        .iter()
        .any(|public| public.eq_ignore_ascii_case(normalized))
    {
        return RouteKind::Public;
    }

    if DASHBOARD_PATH.eq_ignore_ascii_case(normalized) {
        return RouteKind::Authenticated;
    }

    SECTIONS
        .iter()
        .find(|section| section.path.eq_ignore_ascii_case(normalized))
        .map(RouteKind::Guarded)
        .unwrap_or(RouteKind::Unknown)
}

#[cfg(test)]
mod tests {
    use super::{RouteKind, SECTIONS, classify_route};

    #[test]
    fn public_routes_are_recognized() {
        for path in ["/", "", "/register", "/unauthorized", "/Unauthorized/"] {
            assert_eq!(classify_route(path), RouteKind::Public, "{path}");
        }
    }

    #[test]
    fn dashboard_requires_only_authentication() {
        assert_eq!(classify_route("/Home"), RouteKind::Authenticated);
    }

    #[test]
    fn guarded_routes_resolve_to_keyword() {
        match classify_route("/rolemanagement") {
            RouteKind::Guarded(section) => assert_eq!(section.page_keyword, "role"),
            other => panic!("unexpected route kind {other:?}"),
        }
        match classify_route("/site-transactions/") {
            RouteKind::Guarded(section) => assert_eq!(section.page_keyword, "site"),
            other => panic!("unexpected route kind {other:?}"),
        }
    }

    #[test]
    fn unknown_routes_are_flagged() {
        assert_eq!(classify_route("/nowhere"), RouteKind::Unknown);
    }

    #[test]
    fn every_section_has_a_keyword() {
        assert!(SECTIONS.iter().all(|section| !section.page_keyword.is_empty()));
    }
}
