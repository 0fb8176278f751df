use axum::http::StatusCode;
use axum::{Extension, Json};
use kasira_application::Actor;
use kasira_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;

use super::SESSION_USER_KEY;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let employee_id = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .map(|identity| identity.employee_id());

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(employee_id) = employee_id {
        info!(employee_id = %employee_id, "employee signed out");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extension(identity): Extension<UserIdentity>,
    Extension(actor): Extension<Actor>,
) -> Json<UserIdentityResponse> {
    Json(UserIdentityResponse::from_actor(&identity, &actor))
}
