use std::sync::Arc;

use kasira_application::{
    ApprovalRepository, ApprovalService, AuditLogRepository, AuditLogService, AuthorizationService,
    EmployeeRepository, EmployeeService, PasswordHasher, PermissionService, PrincipalRepository,
    ProductRepository, ProductService, TransactionalStore,
};
use kasira_infrastructure::{
    Argon2PasswordHasher, PostgresApprovalRepository, PostgresAuditLogRepository,
    PostgresEmployeeRepository, PostgresPrincipalRepository, PostgresProductRepository,
    PostgresShopStore,
};
use sqlx::PgPool;

use crate::state::AppState;

/// Port implementations the services are wired against.
pub struct ServicePorts {
    pub principals: Arc<dyn PrincipalRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub approvals: Arc<dyn ApprovalRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub store: Arc<dyn TransactionalStore>,
    pub password_hasher: Arc<dyn PasswordHasher>,
}

impl ServicePorts {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            principals: Arc::new(PostgresPrincipalRepository::new(pool.clone())),
            employees: Arc::new(PostgresEmployeeRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            approvals: Arc::new(PostgresApprovalRepository::new(pool.clone())),
            audit_log: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
            store: Arc::new(PostgresShopStore::new(pool.clone())),
            password_hasher: Arc::new(Argon2PasswordHasher::new()),
        }
    }
}

pub fn build_app_state(
    ports: ServicePorts,
    frontend_url: &str,
    postgres_pool: Option<PgPool>,
) -> AppState {
    let authorization_service =
        AuthorizationService::new(ports.principals.clone(), ports.employees.clone());

    AppState {
        permission_service: PermissionService::new(
            authorization_service.clone(),
            ports.principals.clone(),
            ports.store.clone(),
        ),
        approval_service: ApprovalService::new(ports.approvals, ports.store.clone()),
        audit_log_service: AuditLogService::new(ports.audit_log),
        employee_service: EmployeeService::new(
            ports.employees,
            ports.principals,
            ports.store.clone(),
            ports.password_hasher,
        ),
        product_service: ProductService::new(ports.products, ports.store),
        authorization_service,
        frontend_url: frontend_url.to_owned(),
        postgres_pool,
    }
}
