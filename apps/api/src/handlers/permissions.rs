use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::HeaderMap;
use kasira_application::Actor;
use kasira_core::EmployeeId;

use crate::auth::extract_request_context;
use crate::dto::{
    AvailablePermissionsResponse, PermissionChangeRequest, PrincipalPermissionsResponse,
    SyncPermissionsRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn available_permissions_handler(
    State(state): State<AppState>,
) -> Json<AvailablePermissionsResponse> {
    Json(AvailablePermissionsResponse::from(
        state.permission_service.catalog(),
    ))
}

pub async fn principal_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let permissions = state
        .permission_service
        .effective_permissions(&actor, EmployeeId::new(employee_id))
        .await?;

    Ok(Json(PrincipalPermissionsResponse::new(
        employee_id,
        &permissions,
    )))
}

pub async fn sync_permissions_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<SyncPermissionsRequest>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let permissions = state
        .permission_service
        .sync_direct_permissions(
            &actor,
            EmployeeId::new(employee_id),
            &payload.permissions,
            extract_request_context(&headers),
        )
        .await?;

    Ok(Json(PrincipalPermissionsResponse::new(
        employee_id,
        &permissions,
    )))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<PermissionChangeRequest>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let permissions = state
        .permission_service
        .grant(
            &actor,
            EmployeeId::new(employee_id),
            &payload.permission,
            extract_request_context(&headers),
        )
        .await?;

    Ok(Json(PrincipalPermissionsResponse::new(
        employee_id,
        &permissions,
    )))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<PermissionChangeRequest>,
) -> ApiResult<Json<PrincipalPermissionsResponse>> {
    let permissions = state
        .permission_service
        .revoke(
            &actor,
            EmployeeId::new(employee_id),
            &payload.permission,
            extract_request_context(&headers),
        )
        .await?;

    Ok(Json(PrincipalPermissionsResponse::new(
        employee_id,
        &permissions,
    )))
}
