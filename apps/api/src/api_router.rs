mod cors;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use constructmate_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::SectionGuard;
use crate::state::AppState;
use crate::{auth, handlers, middleware};

use self::cors::build_cors_layer;

/// Page keyword guarding the administration routes.
const ADMINISTRATION_PAGE_KEYWORD: &str = "role";

pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let administration_routes = Router::new()
        .route(
            "/api/roles",
            get(handlers::administration::list_roles_handler)
                .post(handlers::administration::create_role_handler)
                .put(handlers::administration::update_role_handler),
        )
        .route(
            "/api/pages",
            get(handlers::administration::list_pages_handler)
                .post(handlers::administration::create_page_handler)
                .put(handlers::administration::update_page_handler),
        )
        .route(
            "/api/role-page-mappings",
            get(handlers::administration::mapping_grid_handler)
                .put(handlers::administration::save_mapping_grid_handler),
        )
        .route_layer(from_fn_with_state(
            SectionGuard {
                state: app_state.clone(),
                page_keyword: ADMINISTRATION_PAGE_KEYWORD,
            },
            middleware::require_section,
        ))
        .route_layer(from_fn(middleware::require_auth));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/api/access/navigation",
            get(handlers::access::navigation_handler),
        )
        .route(
            "/api/access/pages",
            get(handlers::access::permitted_pages_handler),
        )
        .route("/api/access/check", get(handlers::access::check_handler))
        .route("/api/access/guard", get(handlers::access::guard_handler))
        .route("/unauthorized", get(handlers::access::unauthorized_handler))
        .merge(authenticated_routes)
        .merge(administration_routes)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::attach_access_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
