use kasira_application::{
    ApprovalService, AuditLogService, AuthorizationService, EmployeeService, PermissionService,
    ProductService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub permission_service: PermissionService,
    pub approval_service: ApprovalService,
    pub audit_log_service: AuditLogService,
    pub employee_service: EmployeeService,
    pub product_service: ProductService,
    pub frontend_url: String,
    /// Pool probed by the health check; absent for in-memory wiring.
    pub postgres_pool: Option<PgPool>,
}
