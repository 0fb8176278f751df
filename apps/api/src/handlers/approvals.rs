use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use kasira_application::{
    Actor, AdvanceInput, ApprovalListQuery, ApprovalProposal, DEFAULT_PAGE_LIMIT,
};
use kasira_core::EmployeeId;
use kasira_domain::{AccountAction, ApprovalRequestId, Decision, ProductId};
use uuid::Uuid;

use crate::auth::extract_request_context;
use crate::dto::{
    AdvanceApprovalRequest, ApprovalListParams, ApprovalRequestResponse, SubmitPriceChangeRequest,
    SubmitSuspensionRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::parse_optional;

pub async fn list_approvals_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ApprovalListParams>,
) -> ApiResult<Json<Vec<ApprovalRequestResponse>>> {
    let query = ApprovalListQuery {
        limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        offset: params.offset.unwrap_or(0),
        workflow_type: parse_optional(params.workflow_type.as_deref())?,
        status: parse_optional(params.status.as_deref())?,
    };

    let requests = state
        .approval_service
        .list(&actor, query)
        .await?
        .iter()
        .map(ApprovalRequestResponse::from)
        .collect();

    Ok(Json(requests))
}

pub async fn get_approval_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<Json<ApprovalRequestResponse>> {
    let request = state
        .approval_service
        .find(&actor, ApprovalRequestId::from_uuid(request_id))
        .await?;

    Ok(Json(ApprovalRequestResponse::from(&request)))
}

pub async fn submit_price_change_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    Json(payload): Json<SubmitPriceChangeRequest>,
) -> ApiResult<(StatusCode, Json<ApprovalRequestResponse>)> {
    let request = state
        .approval_service
        .submit(
            &actor,
            ApprovalProposal::PriceChange {
                product_id: ProductId::new(payload.product_id),
                new_price: payload.new_price,
                reason: payload.reason,
            },
            extract_request_context(&headers),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApprovalRequestResponse::from(&request)),
    ))
}

pub async fn submit_suspension_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    Json(payload): Json<SubmitSuspensionRequest>,
) -> ApiResult<(StatusCode, Json<ApprovalRequestResponse>)> {
    let action = parse_optional::<AccountAction>(payload.action.as_deref())?.unwrap_or_default();

    let request = state
        .approval_service
        .submit(
            &actor,
            ApprovalProposal::Suspension {
                employee_id: EmployeeId::new(payload.employee_id),
                reason: payload.reason,
                action,
            },
            extract_request_context(&headers),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApprovalRequestResponse::from(&request)),
    ))
}

pub async fn advance_approval_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(request_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<AdvanceApprovalRequest>,
) -> ApiResult<Json<ApprovalRequestResponse>> {
    let decision = payload.decision.parse::<Decision>()?;
    let expected_status = parse_optional(payload.expected_status.as_deref())?;

    let request = state
        .approval_service
        .advance(
            &actor,
            ApprovalRequestId::from_uuid(request_id),
            AdvanceInput {
                decision,
                note: payload.note,
                expected_status,
            },
            extract_request_context(&headers),
        )
        .await?;

    Ok(Json(ApprovalRequestResponse::from(&request)))
}
