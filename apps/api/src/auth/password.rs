use axum::Json;
use axum::extract::State;
use kasira_application::LoginOutcome;
use kasira_core::AppError;
use tower_sessions::Session;

use crate::dto::{AuthLoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AuthLoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let outcome = state
        .employee_service
        .login(&payload.email, &payload.password)
        .await?;

    let LoginOutcome::Authenticated(identity) = outcome else {
        return Err(AppError::Unauthorized("invalid email or password".to_owned()).into());
    };

    // A fresh id on sign-in keeps pre-login session ids from being reused.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    let actor = state
        .authorization_service
        .resolve_actor(identity.employee_id())
        .await?;

    Ok(Json(UserIdentityResponse::from_actor(&identity, &actor)))
}
