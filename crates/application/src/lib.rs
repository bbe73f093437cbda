//! Application services and ports for page-level access control.

#![forbid(unsafe_code)]

mod access_gate;
mod access_ports;
mod access_resolver;
mod access_service;
mod access_session;
mod identity_claims;
mod login_service;

pub use access_gate::{AccessContext, AccessGate, GateTicket};
pub use access_ports::{
    CreatePageInput, CreateRoleInput, CredentialProvider, LoginOutcome, OrganisationSummary,
    ReferenceDataSource, UpdatePageInput, UpdateRoleInput,
};
pub use access_resolver::{AccessResolver, AccessSnapshot, PageAccess};
pub use access_service::{
    AccessService, MappingGrid, MappingGridRow, MenuLink, NavigationMenu, PermittedPages,
    RolePageAssignment, RouteGuardOutcome,
};
pub use access_session::{AccessSession, SessionRegistry};
pub use identity_claims::decode_identity;
pub use login_service::{LoginResult, LoginService};
