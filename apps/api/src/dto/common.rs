use kasira_application::Actor;
use kasira_core::UserIdentity;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming credentials for password sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/auth-login-request.ts"
)]
pub struct AuthLoginRequest {
    pub email: String,
    pub password: String,
}

/// API representation of the signed-in employee.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub employee_id: i64,
    pub display_name: String,
    pub email: String,
    pub primary_role: String,
    pub permissions: Vec<String>,
}

impl UserIdentityResponse {
    pub fn from_actor(identity: &UserIdentity, actor: &Actor) -> Self {
        Self {
            employee_id: identity.employee_id().as_i64(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().to_owned(),
            primary_role: actor.role_at_time().to_owned(),
            permissions: actor
                .permissions()
                .all()
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}
