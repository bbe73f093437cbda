use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use constructmate_application::{AccessSession, RolePageAssignment};
use constructmate_core::AppError;
use constructmate_domain::{PageId, RoleId};

use crate::dto::{
    CreatePageRequest, CreateRoleRequest, MappingGridResponse, PageResponse, RoleResponse,
    SaveMappingGridRequest, UpdatePageRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state.access_service.list_roles(&access_session).await?;
    Ok(Json(roles.iter().map(RoleResponse::from).collect()))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .create_role(&access_session, &payload.name)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .update_role(
            &access_session,
            RoleId::new(payload.role_id)?,
            &payload.name,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pages_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
) -> ApiResult<Json<Vec<PageResponse>>> {
    let pages = state.access_service.list_pages(&access_session).await?;
    Ok(Json(pages.iter().map(PageResponse::from).collect()))
}

pub async fn create_page_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Json(payload): Json<CreatePageRequest>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .create_page(&access_session, &payload.name)
        .await?;
    Ok(StatusCode::CREATED)
}

pub async fn update_page_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Json(payload): Json<UpdatePageRequest>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .update_page(
            &access_session,
            PageId::new(payload.page_id)?,
            &payload.name,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mapping_grid_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
) -> ApiResult<Json<MappingGridResponse>> {
    let grid = state.access_service.mapping_grid(&access_session).await?;
    Ok(Json(MappingGridResponse::from(&grid)))
}

pub async fn save_mapping_grid_handler(
    State(state): State<AppState>,
    Extension(access_session): Extension<Arc<AccessSession>>,
    Json(payload): Json<SaveMappingGridRequest>,
) -> ApiResult<StatusCode> {
    let assignments = assignments_from_request(payload)?;
    state
        .access_service
        .save_mapping_grid(&access_session, assignments)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn assignments_from_request(
    payload: SaveMappingGridRequest,
) -> Result<Vec<RolePageAssignment>, AppError> {
    payload
        .rows
        .into_iter()
        .map(|row| -> Result<RolePageAssignment, AppError> {
            Ok(RolePageAssignment {
                role_id: RoleId::new(row.role_id)?,
                page_ids: row
                    .page_ids
                    .into_iter()
                    .map(PageId::new)
                    .collect::<Result<Vec<_>, _>>()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use constructmate_core::AppError;

    use super::assignments_from_request;
    use crate::dto::{RolePageAssignmentRequest, SaveMappingGridRequest};

    #[test]
    fn blank_ids_are_rejected() {
        let result = assignments_from_request(SaveMappingGridRequest {
            rows: vec![RolePageAssignmentRequest {
                role_id: "3".to_owned(),
                page_ids: vec!["10".to_owned(), " ".to_owned()],
            }],
        });

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn rows_convert_to_assignments() {
        let assignments = assignments_from_request(SaveMappingGridRequest {
            rows: vec![RolePageAssignmentRequest {
                role_id: " 3 ".to_owned(),
                page_ids: vec!["10".to_owned(), "11".to_owned()],
            }],
        })
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(assignments.len(), 1);
        let assignment = assignments.first().unwrap_or_else(|| unreachable!());
        assert_eq!(assignment.role_id.as_str(), "3");
        assert_eq!(assignment.page_ids.len(), 2);
    }
}
