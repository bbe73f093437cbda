use std::sync::Arc;

use axum::extract::{Extension, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use constructmate_application::{AccessSession, RouteGuardOutcome};
use constructmate_core::AppError;
use constructmate_domain::LOGIN_PATH;
use tower_sessions::Session;
use tracing::info;

use crate::auth::stored_credential;
use crate::error::ApiResult;
use crate::state::AppState;

/// Seconds a client should wait before retrying a pending decision.
const PENDING_RETRY_AFTER_SECONDS: &str = "1";

/// Route guard bound to one page keyword.
#[derive(Clone)]
pub struct SectionGuard {
    pub state: AppState,
    pub page_keyword: &'static str,
}

/// Binds the access session of the HTTP session to the request.
///
/// Requests without a stored credential get an anonymous session. When a pass logs
/// the session out, the stored credential is flushed as well.
pub async fn attach_access_session(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let registry_key = session.id().map(|id| id.to_string());
    let access_session = match (stored_credential(&session).await?, &registry_key) {
        (Some((token, identity)), Some(key)) => {
            state
                .session_registry
                .get_or_insert_with(key, || AccessSession::authenticated(token, identity))
                .await
        }
        (Some((token, identity)), None) => {
            Arc::new(AccessSession::authenticated(token, identity))
        }
        (None, _) => Arc::new(AccessSession::anonymous()),
    };

    let was_authenticated = access_session.identity().await.is_some();
    request.extensions_mut().insert(access_session.clone());
    let response = next.run(request).await;

    if was_authenticated && access_session.identity().await.is_none() {
        info!("credential rejected upstream; clearing session");
        if let Some(key) = registry_key {
            state.session_registry.remove(&key).await;
        }
        session
            .flush()
            .await
            .map_err(|error| AppError::Internal(format!("failed to flush session: {error}")))?;
    }

    Ok(response)
}

pub async fn require_auth(
    Extension(access_session): Extension<Arc<AccessSession>>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if access_session.identity().await.is_none() {
        return Err(AppError::Unauthorized("authentication required".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Lets the request through only when the section's page is allowed.
pub async fn require_section(
    State(guard): State<SectionGuard>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let outcome = guard
        .state
        .access_service
        .guard_section(&access_session, guard.page_keyword)
        .await;

    match guard_response(outcome) {
        Some(response) => Ok(response),
        None => Ok(next.run(request).await),
    }
}

/// Maps a route-guard outcome to a short-circuit response; `None` means proceed.
pub fn guard_response(outcome: RouteGuardOutcome) -> Option<Response> {
    match outcome {
        RouteGuardOutcome::Render => None,
        RouteGuardOutcome::Wait(_) => Some(
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(
                    header::RETRY_AFTER,
                    HeaderValue::from_static(PENDING_RETRY_AFTER_SECONDS),
                )],
            )
                .into_response(),
        ),
        RouteGuardOutcome::Redirect(LOGIN_PATH) => Some(
            crate::error::ApiError::from(AppError::Unauthorized(
                "authentication required".to_owned(),
            ))
            .into_response(),
        ),
        RouteGuardOutcome::Redirect(target) => Some(Redirect::to(target).into_response()),
    }
}
