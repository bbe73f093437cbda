use std::sync::Arc;

use constructmate_application::{AccessService, LoginService, SessionRegistry};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_service: AccessService,
    pub login_service: LoginService,
    pub session_registry: Arc<SessionRegistry>,
}
