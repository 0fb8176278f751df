use axum::Json;
use axum::extract::{Extension, Query, State};
use kasira_application::{Actor, AuditLogQuery, DEFAULT_PAGE_LIMIT};

use crate::dto::{AuditLogEntryResponse, AuditLogParams};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_optional, parse_timestamp};

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let query = AuditLogQuery {
        limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        offset: params.offset.unwrap_or(0),
        date_from: parse_timestamp(params.date_from.as_deref(), "date_from")?,
        date_to: parse_timestamp(params.date_to.as_deref(), "date_to")?,
        event: parse_optional(params.event.as_deref())?,
        subject_type: parse_optional(params.subject_type.as_deref())?,
    };

    let entries = state
        .audit_log_service
        .list(&actor, query)
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(entries))
}
