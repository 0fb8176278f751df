mod approvals;
mod audit;
mod catalog;
mod common;
mod permissions;

pub use approvals::{
    AdvanceApprovalRequest, ApprovalListParams, ApprovalRequestResponse, StageOutcomeResponse,
    StageRecordResponse, SubmitPriceChangeRequest, SubmitSuspensionRequest,
};
pub use audit::{AuditLogEntryResponse, AuditLogParams};
pub use catalog::{
    AssignRolesRequest, CreateEmployeeRequest, CreateProductRequest, CreatedEmployeeResponse,
    EmployeeResponse, ProductResponse, UpdateProductRequest,
};
pub use common::{AuthLoginRequest, HealthResponse, UserIdentityResponse};
pub use permissions::{
    AvailablePermissionsResponse, PermissionChangeRequest, PrincipalPermissionsResponse,
    SyncPermissionsRequest,
};

#[cfg(test)]
mod tests {
    use super::{
        AdvanceApprovalRequest, ApprovalRequestResponse, AssignRolesRequest, AuditLogEntryResponse,
        AuthLoginRequest, AvailablePermissionsResponse, CreateEmployeeRequest, CreateProductRequest,
        CreatedEmployeeResponse, EmployeeResponse, HealthResponse, PermissionChangeRequest,
        PrincipalPermissionsResponse, ProductResponse, StageOutcomeResponse, StageRecordResponse,
        SubmitPriceChangeRequest, SubmitSuspensionRequest, SyncPermissionsRequest,
        UpdateProductRequest, UserIdentityResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        HealthResponse::export(&config)?;
        AuthLoginRequest::export(&config)?;
        UserIdentityResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        AvailablePermissionsResponse::export(&config)?;
        PrincipalPermissionsResponse::export(&config)?;
        SyncPermissionsRequest::export(&config)?;
        PermissionChangeRequest::export(&config)?;
        SubmitPriceChangeRequest::export(&config)?;
        SubmitSuspensionRequest::export(&config)?;
        AdvanceApprovalRequest::export(&config)?;
        ApprovalRequestResponse::export(&config)?;
        StageRecordResponse::export(&config)?;
        StageOutcomeResponse::export(&config)?;
        AuditLogEntryResponse::export(&config)?;
        CreateEmployeeRequest::export(&config)?;
        CreatedEmployeeResponse::export(&config)?;
        EmployeeResponse::export(&config)?;
        AssignRolesRequest::export(&config)?;
        CreateProductRequest::export(&config)?;
        UpdateProductRequest::export(&config)?;
        ProductResponse::export(&config)?;

        Ok(())
    }
}
