//! Application services and ports.

#![forbid(unsafe_code)]

mod approval_ports;
mod approval_service;
mod audit_log_service;
mod authorization_service;
mod catalog_ports;
mod employee_service;
mod permission_service;
mod principal_locks;
mod product_service;
mod security_ports;
mod side_effect_applier;
mod store_ports;

#[cfg(test)]
mod test_support;

pub use approval_ports::{ApprovalListQuery, ApprovalRepository};
pub use approval_service::{AdvanceInput, ApprovalProposal, ApprovalService};
pub use audit_log_service::{AuditLogService, AuditRecord};
pub use authorization_service::{Actor, AuthorizationService};
pub use catalog_ports::{EmployeeCredentials, EmployeeRepository, PasswordHasher, ProductRepository};
pub use employee_service::{CreatedEmployee, EmployeeService, LoginOutcome, NewEmployeeInput};
pub use permission_service::PermissionService;
pub use principal_locks::PrincipalLocks;
pub use product_service::{NewProductInput, ProductService};
pub use security_ports::{AuditLogEntry, AuditLogQuery, AuditLogRepository, PrincipalRepository};
pub use side_effect_applier::SideEffectApplier;
pub use store_ports::{NewEmployee, NewProduct, StoreTransaction, TransactionalStore};

/// Page size used when a listing does not specify one.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Largest page size a listing returns.
pub const MAX_PAGE_LIMIT: usize = 200;

/// Clamps a requested page size into `1..=MAX_PAGE_LIMIT`.
#[must_use]
pub fn clamp_page_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_PAGE_LIMIT)
}
