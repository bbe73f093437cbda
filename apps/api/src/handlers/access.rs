use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use constructmate_application::AccessSession;
use constructmate_core::AppError;
use constructmate_domain::PageSelector;

use crate::dto::{
    AccessCheckQuery, AccessDecisionResponse, GenericMessageResponse, NavigationResponse,
    PermittedPagesResponse, RouteGuardQuery, RouteGuardResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/access/navigation - Menu entries the session may follow.
pub async fn navigation_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
) -> Json<NavigationResponse> {
    Json(state.access_service.navigation(&access_session).await.into())
}

/// GET /api/access/pages - Page ids the session may reach.
pub async fn permitted_pages_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
) -> Json<PermittedPagesResponse> {
    Json(
        state
            .access_service
            .permitted_pages(&access_session)
            .await
            .into(),
    )
}

/// GET /api/access/check - One access decision by page id or keyword.
pub async fn check_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Query(query): Query<AccessCheckQuery>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let selector = selector_from_query(query)?;
    let decision = state
        .access_service
        .evaluate(&access_session, &selector)
        .await;
    Ok(Json(decision.into()))
}

/// GET /api/access/guard - Route-guard instruction for a navigation target.
pub async fn guard_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Query(query): Query<RouteGuardQuery>,
) -> Json<RouteGuardResponse> {
    Json(
        state
            .access_service
            .guard_route(&access_session, &query.path)
            .await
            .into(),
    )
}

/// GET /unauthorized - Fixed destination for denied navigations.
pub async fn unauthorized_handler() -> (StatusCode, Json<GenericMessageResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(GenericMessageResponse {
            message: "You don't have permission to view this page.".to_owned(),
        }),
    )
}

fn selector_from_query(query: AccessCheckQuery) -> Result<PageSelector, AppError> {
    match (query.page_id, query.keyword) {
        (Some(page_id), None) => PageSelector::page_id(page_id),
        (None, Some(keyword)) => Ok(PageSelector::keyword(keyword)),
        _ => Err(AppError::Validation(
            "exactly one of 'page_id' or 'keyword' is required".to_owned(),
        )),
    }
}
