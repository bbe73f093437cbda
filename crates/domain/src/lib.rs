//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod navigation;

pub use access::{
    AccessDecision, Page, PageId, PageSelector, PendingReason, Role, RoleId, RolePageMapping,
    is_admin_role_name, is_privileged_role_name, normalize_role_name,
};
pub use navigation::{
    DASHBOARD_PATH, LOGIN_PATH, RouteKind, SECTIONS, Section, UNAUTHORIZED_PATH, classify_route,
};
