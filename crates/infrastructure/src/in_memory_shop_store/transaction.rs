use kasira_application::{NewEmployee, NewProduct};
use kasira_core::AppError;
use kasira_domain::{AccountStatus, ApprovalStatus, Permission, StageRecord};
use tokio::sync::OwnedMutexGuard;

use super::*;

/// Open transaction over the in-memory shop.
pub(super) struct InMemoryStoreTransaction {
    guard: OwnedMutexGuard<ShopState>,
    snapshot: Option<ShopState>,
}

impl InMemoryStoreTransaction {
    pub(super) fn new(guard: OwnedMutexGuard<ShopState>) -> Self {
        let snapshot = guard.clone();
        Self {
            guard,
            snapshot: Some(snapshot),
        }
    }
}

impl Drop for InMemoryStoreTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StoreTransaction for InMemoryStoreTransaction {
    async fn insert_approval_request(&mut self, request: &ApprovalRequest) -> AppResult<()> {
        if self
            .guard
            .requests
            .iter()
            .any(|stored| stored.id() == request.id())
        {
            return Err(AppError::Conflict(format!(
                "approval request '{}' already exists",
                request.id()
            )));
        }

        self.guard.requests.push(request.clone());
        Ok(())
    }

    async fn compare_and_set_approval_status(
        &mut self,
        request_id: ApprovalRequestId,
        expected: ApprovalStatus,
        next: ApprovalStatus,
        record: &StageRecord,
    ) -> AppResult<bool> {
        let Some(request) = self
            .guard
            .requests
            .iter_mut()
            .find(|request| request.id() == request_id)
        else {
            return Ok(false);
        };
        if request.status() != expected {
            return Ok(false);
        }

        request.record_decision(next, record.clone());
        Ok(true)
    }

    async fn find_product_for_update(
        &mut self,
        product_id: ProductId,
    ) -> AppResult<Option<Product>> {
        Ok(self.guard.products.get(&product_id).cloned())
    }

    async fn insert_product(&mut self, product: NewProduct) -> AppResult<Product> {
        if self.guard.sku_taken(&product.sku, None) {
            return Err(AppError::Conflict(format!(
                "a product with sku '{}' already exists",
                product.sku
            )));
        }

        self.guard.next_product_id += 1;
        let product_id = ProductId::new(self.guard.next_product_id);
        let created = Product::new(product_id, product.name, product.sku, product.price)?;
        self.guard.products.insert(product_id, created.clone());

        Ok(created)
    }

    async fn update_product(&mut self, product: &Product) -> AppResult<()> {
        if !self.guard.products.contains_key(&product.id()) {
            return Err(AppError::NotFound(format!(
                "product '{}' not found",
                product.id()
            )));
        }
        if self.guard.sku_taken(product.sku(), Some(product.id())) {
            return Err(AppError::Conflict(format!(
                "a product with sku '{}' already exists",
                product.sku()
            )));
        }

        self.guard.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn find_employee_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>> {
        Ok(self
            .guard
            .employees
            .get(&employee_id)
            .map(|credentials| credentials.employee.clone()))
    }

    async fn insert_employee(&mut self, employee: NewEmployee) -> AppResult<Employee> {
        if self
            .guard
            .employee_email_taken(employee.email.as_str(), None)
        {
            return Err(AppError::Conflict(format!(
                "an employee with email '{}' already exists",
                employee.email.as_str()
            )));
        }

        self.guard.next_employee_id += 1;
        let employee_id = EmployeeId::new(self.guard.next_employee_id);
        let created = Employee::new(
            employee_id,
            employee.display_name,
            employee.email,
            AccountStatus::Active,
        )?;
        self.guard.employees.insert(
            employee_id,
            EmployeeCredentials {
                employee: created.clone(),
                password_hash: employee.password_hash,
            },
        );
        let additional_roles = role_set(&employee.primary_role, &employee.additional_roles);
        self.guard.principals.insert(
            employee_id,
            Principal::new(
                employee_id,
                employee.primary_role,
                additional_roles,
                Vec::new(),
            ),
        );

        Ok(created)
    }

    async fn update_account_status(
        &mut self,
        employee_id: EmployeeId,
        account_status: AccountStatus,
    ) -> AppResult<()> {
        let credentials = self
            .guard
            .employees
            .get_mut(&employee_id)
            .ok_or_else(|| AppError::NotFound(format!("employee '{employee_id}' not found")))?;
        credentials.employee = credentials
            .employee
            .clone()
            .with_account_status(account_status);

        Ok(())
    }

    async fn find_principal_for_update(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Principal>> {
        Ok(self.guard.principals.get(&employee_id).cloned())
    }

    async fn replace_direct_permissions(
        &mut self,
        employee_id: EmployeeId,
        permissions: &BTreeSet<Permission>,
    ) -> AppResult<()> {
        let principal = self
            .guard
            .principals
            .remove(&employee_id)
            .ok_or_else(|| AppError::NotFound(format!("employee '{employee_id}' not found")))?;
        self.guard.principals.insert(
            employee_id,
            principal.with_direct_permissions(permissions.clone()),
        );

        Ok(())
    }

    async fn replace_roles(
        &mut self,
        employee_id: EmployeeId,
        primary_role: &str,
        additional_roles: &BTreeSet<String>,
    ) -> AppResult<()> {
        let direct_permissions = self
            .guard
            .principals
            .get(&employee_id)
            .map(|principal| principal.direct_permissions().clone())
            .ok_or_else(|| AppError::NotFound(format!("employee '{employee_id}' not found")))?;
        self.guard.principals.insert(
            employee_id,
            Principal::new(
                employee_id,
                primary_role,
                role_set(primary_role, additional_roles),
                direct_permissions,
            ),
        );

        Ok(())
    }

    async fn append_audit_entry(&mut self, entry: &AuditLogEntry) -> AppResult<()> {
        self.guard.audit_entries.push(entry.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> AppResult<()> {
        self.snapshot = None;
        Ok(())
    }
}
