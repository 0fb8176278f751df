//! PostgreSQL transactional store.
//!
//! Each [`PostgresStoreTransaction`] wraps one `sqlx` transaction. Rows read
//! "for update" are locked with `SELECT ... FOR UPDATE` until commit or
//! rollback; dropping the transaction rolls back.

use std::collections::BTreeSet;

use async_trait::async_trait;
use kasira_application::{
    AuditLogEntry, NewEmployee, NewProduct, StoreTransaction, TransactionalStore,
};
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountStatus, ApprovalRequest, ApprovalRequestId, ApprovalStatus, Employee, Permission,
    Principal, Product, ProductId, StageRecord,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::postgres_rows::{EmployeeRow, ProductRow, fetch_principal, map_unique_violation};

mod approvals;
mod catalog;
mod principals;


/// PostgreSQL-backed transactional store.
#[derive(Clone)]
pub struct PostgresShopStore {
    pool: PgPool,
}

impl PostgresShopStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionalStore for PostgresShopStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        Ok(Box::new(PostgresStoreTransaction { transaction }))
    }
}

/// One open PostgreSQL transaction.
pub struct PostgresStoreTransaction {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresStoreTransaction {
    async fn insert_approval_request(&mut self, request: &ApprovalRequest) -> AppResult<()> {
        self.insert_approval_request_impl(request).await
    }

    async fn compare_and_set_approval_status(
        &mut self,
        request_id: ApprovalRequestId,
        expected: ApprovalStatus,
        next: ApprovalStatus,
        record: &StageRecord,
    ) -> AppResult<bool> {
        self.compare_and_set_approval_status_impl(request_id, expected, next, record)
            .await
    }

    async fn find_product_for_update(
        &mut self,
        product_id: ProductId,
    ) -> AppResult<Option<Product>> {
        self.find_product_for_update_impl(product_id).await
    }

    async fn insert_product(&mut self, product: NewProduct) -> AppResult<Product> {
        self.insert_product_impl(product).await
    }

    async fn update_product(&mut self, product: &Product) -> AppResult<()> {
        self.update_product_impl(product).await
    }

    async fn find_employee_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>> {
        self.find_employee_for_update_impl(employee_id).await
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee> {
        self.insert_employee_impl(employee).await
    }

    async fn update_account_status(
        &mut self,
        employee_id: EmployeeId,
        account_status: AccountStatus,
    ) -> AppResult<()> {
        self.update_account_status_impl(employee_id, account_status)
            .await
    }

    async fn find_principal_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Principal>> {
        self.find_principal_for_update_impl(employee_id).await
    }

    async fn replace_direct_permissions(
        &mut self,
        employee_id: EmployeeId,
        permissions: &BTreeSet<Permission>,
    ) -> AppResult<()> {
        self.replace_direct_permissions_impl(employee_id, permissions)
            .await
    }

    async fn replace_roles(
        &mut self,
        employee_id: EmployeeId,
        primary_role: &str,
        additional_roles: &BTreeSet<String>,
    ) -> AppResult<()> {
        self.replace_roles_impl(employee_id, primary_role, additional_roles)
            .await
    }

    async fn append_audit_entry(&mut self, entry: &AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                id,
                event,
                subject_type,
                subject_id,
                causer_id,
                changes,
                ip,
                user_agent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.event.as_str())
        .bind(entry.subject_type.as_str())
        .bind(entry.subject_id.as_str())
        .bind(entry.causer_id.map(|causer_id| causer_id.as_i64()))
        .bind(Json(&entry.changes))
        .bind(entry.metadata.ip.as_deref())
        .bind(entry.metadata.user_agent.as_deref())
        .bind(entry.created_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
