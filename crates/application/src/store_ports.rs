//! Transactional write port.
//!
//! Every tracked mutation runs inside one [`StoreTransaction`] together with
//! its audit entry. Dropping a transaction without calling
//! [`StoreTransaction::commit`] discards every write made through it.

use std::collections::BTreeSet;

use async_trait::async_trait;
use kasira_core::{AppResult, EmployeeId};
use kasira_domain::{
    AccountStatus, ApprovalRequest, ApprovalRequestId, ApprovalStatus, EmailAddress, Employee,
    Permission, Price, Principal, Product, ProductId, StageRecord,
};

use crate::AuditLogEntry;

/// Attributes of a product before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Initial price.
    pub price: Price,
}

/// Attributes of an employee before storage assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    /// Display name.
    pub display_name: String,
    /// Login email.
    pub email: EmailAddress,
    /// Argon2id hash of the initial password.
    pub password_hash: String,
    /// Primary role name.
    pub primary_role: String,
    /// Additional role names.
    pub additional_roles: BTreeSet<String>,
}

/// Port that opens write transactions.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;
}

/// One atomic unit of writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Persists a newly submitted approval request.
    async fn insert_approval_request(&mut self, request: &ApprovalRequest) -> AppResult<()>;

    /// Moves a request from `expected` to `next` and appends the stage record.
    ///
    /// Returns `false` without writing when the stored status is not `expected`.
    async fn compare_and_set_approval_status(
        &mut self,
        request_id: ApprovalRequestId,
        expected: ApprovalStatus,
        next: ApprovalStatus,
        record: &StageRecord,
    ) -> AppResult<bool>;

    /// Loads a product and holds it against concurrent writers.
    async fn find_product_for_update(&mut self, product_id: ProductId)
    -> AppResult<Option<Product>>;

    /// Inserts a product and returns it with its assigned id.
    async fn insert_product(&mut self, product: NewProduct) -> AppResult<Product>;

    /// Overwrites a product's stored attributes.
    async fn update_product(&mut self, product: &Product) -> AppResult<()>;

    /// Loads an employee and holds it against concurrent writers.
    async fn find_employee_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>>;

    /// Inserts an employee and returns it with its assigned id.
    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee>;

    /// Changes an employee's account status.
    async fn update_account_status(
        &mut self,
        employee_id: EmployeeId,
        account_status: AccountStatus,
    ) -> AppResult<()>;

    /// Loads a principal and holds it against concurrent writers.
    async fn find_principal_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Principal>>;

    /// Replaces the stored direct-grant overlay.
    async fn replace_direct_permissions(
        &mut self,
        employee_id: EmployeeId,
        permissions: &BTreeSet<Permission>,
    ) -> AppResult<()>;

    /// Replaces primary and additional roles.
    async fn replace_roles(
        &mut self,
        employee_id: EmployeeId,
        primary_role: &str,
        additional_roles: &BTreeSet<String>,
    ) -> AppResult<()>;

    /// Appends one audit entry.
    async fn append_audit_entry(&mut self, entry: &AuditLogEntry) -> AppResult<()>;

    /// Makes every write visible.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
