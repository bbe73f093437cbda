use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use constructmate_application::AccessSession;
use constructmate_core::{AppError, BearerToken, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_TOKEN_KEY: &str = "bearer_token";
pub const SESSION_USER_KEY: &str = "user_identity";
pub const SESSION_ORGANISATION_NAME_KEY: &str = "organisation_name";

/// Reads the credential stored in the HTTP session, if any.
pub async fn stored_credential(
    session: &Session,
) -> ApiResult<Option<(BearerToken, UserIdentity)>> {
    let token = session
        .get::<BearerToken>(SESSION_TOKEN_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session token: {error}")))?;
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?;

    Ok(token.zip(identity))
}

/// POST /auth/login - Exchange credentials for a server-side session.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let result = state
        .login_service
        .login(&payload.user_name, &payload.password)
        .await?;

    if let Some(previous_id) = session.id() {
        state
            .session_registry
            .remove(&previous_id.to_string())
            .await;
    }

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_TOKEN_KEY, &result.token)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session token: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &result.identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;
    session
        .insert(SESSION_ORGANISATION_NAME_KEY, &result.organisation_name)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist organisation name: {error}"))
        })?;

    session
        .save()
        .await
        .map_err(|error| AppError::Internal(format!("failed to save session: {error}")))?;
    if let Some(session_id) = session.id() {
        state
            .session_registry
            .insert(session_id.to_string(), Arc::new(result.session()))
            .await;
    }

    info!(
        role_name = %result.identity.role_name(),
        organisation_resolved = result.identity.organisation_id().is_some(),
        "session established"
    );

    Ok(Json(UserIdentityResponse::from_identity(
        &result.identity,
        result.organisation_name,
    )))
}

/// POST /auth/logout - Drop the credential and its access state.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    session: Session,
) -> ApiResult<StatusCode> {
    access_session.logout().await;
    if let Some(session_id) = session.id() {
        state
            .session_registry
            .remove(&session_id.to_string())
            .await;
    }

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me - Current identity and organisation.
pub async fn me_handler(
    Extension(access_session): Extension<Arc<AccessSession>>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = access_session
        .identity()
        .await
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let organisation_name = session
        .get::<Option<String>>(SESSION_ORGANISATION_NAME_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read organisation name: {error}"))
        })?
        .flatten();

    Ok(Json(UserIdentityResponse::from_identity(
        &identity,
        organisation_name,
    )))
}
