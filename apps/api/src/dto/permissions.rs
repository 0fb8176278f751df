use std::collections::BTreeMap;

use kasira_domain::{EffectivePermissions, PermissionCatalog};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The permission catalog, flat and grouped by module.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/available-permissions-response.ts"
)]
pub struct AvailablePermissionsResponse {
    pub all: Vec<String>,
    pub grouped: BTreeMap<String, Vec<String>>,
}

impl From<&PermissionCatalog> for AvailablePermissionsResponse {
    fn from(catalog: &PermissionCatalog) -> Self {
        Self {
            all: catalog
                .all()
                .into_iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            grouped: catalog
                .grouped()
                .iter()
                .map(|(module, permissions)| {
                    (
                        (*module).to_owned(),
                        permissions
                            .iter()
                            .map(|permission| permission.as_str().to_owned())
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

/// Effective permissions of one principal split by source.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/principal-permissions-response.ts"
)]
pub struct PrincipalPermissionsResponse {
    pub employee_id: i64,
    pub role_derived: Vec<String>,
    pub direct: Vec<String>,
}

impl PrincipalPermissionsResponse {
    pub fn new(employee_id: i64, permissions: &EffectivePermissions) -> Self {
        Self {
            employee_id,
            role_derived: permissions
                .role_derived()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            direct: permissions
                .direct()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Desired full permission set for a principal.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sync-permissions-request.ts"
)]
pub struct SyncPermissionsRequest {
    pub permissions: Vec<String>,
}

/// One permission to grant or revoke.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-change-request.ts"
)]
pub struct PermissionChangeRequest {
    pub permission: String,
}
