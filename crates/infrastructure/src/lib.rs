//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod in_memory_shop_store;
mod postgres_approval_repository;
mod postgres_audit_log_repository;
mod postgres_employee_repository;
mod postgres_principal_repository;
mod postgres_product_repository;
mod postgres_rows;
mod postgres_shop_store;

#[cfg(test)]
mod postgres_test_support;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use in_memory_shop_store::InMemoryShopStore;
pub use postgres_approval_repository::PostgresApprovalRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_employee_repository::PostgresEmployeeRepository;
pub use postgres_principal_repository::PostgresPrincipalRepository;
pub use postgres_product_repository::PostgresProductRepository;
pub use postgres_shop_store::{PostgresShopStore, PostgresStoreTransaction};
