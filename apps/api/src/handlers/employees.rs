use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use kasira_application::{Actor, NewEmployeeInput};
use kasira_core::EmployeeId;

use crate::auth::extract_request_context;
use crate::dto::{
    AssignRolesRequest, CreateEmployeeRequest, CreatedEmployeeResponse, EmployeeResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_employee_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    Json(payload): Json<CreateEmployeeRequest>,
) -> ApiResult<(StatusCode, Json<CreatedEmployeeResponse>)> {
    let created = state
        .employee_service
        .create_employee(
            &actor,
            NewEmployeeInput {
                display_name: payload.display_name,
                email: payload.email,
                primary_role: payload.primary_role,
                additional_roles: payload.additional_roles,
            },
            extract_request_context(&headers),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedEmployeeResponse::from(created)),
    ))
}

pub async fn get_employee_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
) -> ApiResult<Json<EmployeeResponse>> {
    let employee = state
        .employee_service
        .find_employee(&actor, EmployeeId::new(employee_id))
        .await?;

    Ok(Json(EmployeeResponse::from(&employee)))
}

pub async fn assign_roles_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(employee_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<AssignRolesRequest>,
) -> ApiResult<StatusCode> {
    state
        .employee_service
        .assign_roles(
            &actor,
            EmployeeId::new(employee_id),
            &payload.primary_role,
            &payload.additional_roles,
            extract_request_context(&headers),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
