use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use kasira_core::{AppError, UserIdentity};
use tower_sessions::Session;
use tracing::warn;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the signed-in employee into an `Actor` for the request.
///
/// Roles and grants are re-read here on every request, so permission changes
/// and suspensions take effect without a new login.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let actor = match state
        .authorization_service
        .resolve_actor(identity.employee_id())
        .await
    {
        Ok(actor) => actor,
        Err(AppError::Unauthorized(message)) => {
            warn!(employee_id = %identity.employee_id(), "dropping session: {message}");
            session
                .flush()
                .await
                .map_err(|error| AppError::Internal(format!("failed to flush session: {error}")))?;
            return Err(AppError::Unauthorized(message).into());
        }
        Err(error) => return Err(error.into()),
    };

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url.as_str();
        if origin != allowed_origin && !referer.starts_with(allowed_origin) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}
