//! Hand-written fakes shared by service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountStatus, ApprovalRequest, ApprovalRequestId, ApprovalStatus, DefaultRole, EmailAddress,
    Employee, Permission, Price, Principal, Product, ProductId, Role, StageRecord,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Actor, ApprovalListQuery, ApprovalRepository, ApprovalService, AuditLogEntry,
    AuthorizationService, EmployeeCredentials, EmployeeRepository, EmployeeService, NewEmployee,
    NewProduct, PasswordHasher, PermissionService, PrincipalRepository, ProductRepository,
    ProductService, StoreTransaction, TransactionalStore,
};

#[derive(Clone, Default)]
pub(crate) struct FakeState {
    roles: Vec<Role>,
    employees: BTreeMap<EmployeeId, EmployeeCredentials>,
    principals: BTreeMap<EmployeeId, Principal>,
    products: BTreeMap<ProductId, Product>,
    requests: Vec<ApprovalRequest>,
    audit_entries: Vec<AuditLogEntry>,
    next_id: i64,
}

impl FakeState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Single-lock store implementing every port.
#[derive(Clone, Default)]
pub(crate) struct FakeStore {
    state: Arc<Mutex<FakeState>>,
}

/// Every service wired to one fake store.
pub(crate) struct Services {
    pub authorization: AuthorizationService,
    pub permissions: PermissionService,
    pub approvals: ApprovalService,
    pub employees: EmployeeService,
    pub products: ProductService,
}

impl FakeStore {
    pub(crate) async fn with_default_roles() -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().await;
            state.roles = DefaultRole::all()
                .iter()
                .filter_map(|role| role.definition().ok())
                .collect();
            state.next_id = 1000;
        }
        store
    }

    pub(crate) fn services(&self) -> Services {
        let store: Arc<Self> = Arc::new(self.clone());
        let authorization = AuthorizationService::new(store.clone(), store.clone());

        Services {
            permissions: PermissionService::new(
                authorization.clone(),
                store.clone(),
                store.clone(),
            ),
            approvals: ApprovalService::new(store.clone(), store.clone()),
            employees: EmployeeService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                Arc::new(FakePasswordHasher),
            ),
            products: ProductService::new(store.clone(), store),
            authorization,
        }
    }

    pub(crate) async fn seed_employee(
        &self,
        id: i64,
        primary_role: DefaultRole,
        additional_roles: &[DefaultRole],
        direct_permissions: &[Permission],
    ) -> EmployeeId {
        let employee_id = EmployeeId::new(id);
        let email = EmailAddress::new(format!("employee{id}@kasira.test"));
        let employee = email.and_then(|email| {
            Employee::new(
                employee_id,
                format!("Employee {id}"),
                email,
                AccountStatus::Active,
            )
        });

        let mut state = self.state.lock().await;
        if let Ok(employee) = employee {
            state.employees.insert(
                employee_id,
                EmployeeCredentials {
                    employee,
                    password_hash: FakePasswordHasher::hash("secret"),
                },
            );
        }
        state.principals.insert(
            employee_id,
            Principal::new(
                employee_id,
                primary_role.as_str(),
                additional_roles.iter().map(|role| role.as_str().to_owned()),
                direct_permissions.iter().copied(),
            ),
        );

        employee_id
    }

    pub(crate) async fn seed_product(&self, id: i64, price: i64) -> ProductId {
        let product_id = ProductId::new(id);
        let product = Price::new(price).and_then(|price| {
            Product::new(
                product_id,
                format!("Product {id}"),
                format!("sku-{id}"),
                price,
            )
        });

        if let Ok(product) = product {
            self.state.lock().await.products.insert(product_id, product);
        }

        product_id
    }

    pub(crate) async fn set_account_status(&self, employee_id: EmployeeId, status: AccountStatus) {
        let mut state = self.state.lock().await;
        if let Some(credentials) = state.employees.get_mut(&employee_id) {
            credentials.employee = credentials.employee.clone().with_account_status(status);
        }
    }

    pub(crate) async fn remove_product(&self, product_id: ProductId) {
        self.state.lock().await.products.remove(&product_id);
    }

    pub(crate) async fn actor(&self, employee_id: EmployeeId) -> Actor {
        let state = self.state.lock().await;
        let principal = state
            .principals
            .get(&employee_id)
            .cloned()
            .unwrap_or_else(|| Principal::new(employee_id, "staff", Vec::new(), Vec::new()));
        let permissions = kasira_domain::EffectivePermissions::resolve(&principal, &state.roles);
        Actor::new(principal, permissions)
    }

    pub(crate) async fn product(&self, product_id: ProductId) -> Option<Product> {
        self.state.lock().await.products.get(&product_id).cloned()
    }

    pub(crate) async fn employee(&self, employee_id: EmployeeId) -> Option<Employee> {
        self.state
            .lock()
            .await
            .employees
            .get(&employee_id)
            .map(|credentials| credentials.employee.clone())
    }

    pub(crate) async fn principal(&self, employee_id: EmployeeId) -> Option<Principal> {
        self.state
            .lock()
            .await
            .principals
            .get(&employee_id)
            .cloned()
    }

    pub(crate) async fn request(&self, request_id: ApprovalRequestId) -> Option<ApprovalRequest> {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .find(|request| request.id() == request_id)
            .cloned()
    }

    pub(crate) async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().await.audit_entries.clone()
    }
}

#[async_trait]
impl PrincipalRepository for FakeStore {
    async fn find_principal(&self, employee_id: EmployeeId) -> AppResult<Option<Principal>> {
        Ok(self.principal(employee_id).await)
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.state.lock().await.roles.clone())
    }

    async fn ensure_roles(&self, roles: &[Role]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for role in roles {
            if !state.roles.iter().any(|known| known.name() == role.name()) {
                state.roles.push(role.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeRepository for FakeStore {
    async fn find_employee(&self, employee_id: EmployeeId) -> AppResult<Option<Employee>> {
        Ok(self.employee(employee_id).await)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<EmployeeCredentials>> {
        Ok(self
            .state
            .lock()
            .await
            .employees
            .values()
            .find(|credentials| credentials.employee.email().as_str() == email)
            .cloned())
    }

    async fn count_employees(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.employees.len() as u64)
    }
}

#[async_trait]
impl ProductRepository for FakeStore {
    async fn find_product(&self, product_id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.product(product_id).await)
    }
}

#[async_trait]
impl ApprovalRepository for FakeStore {
    async fn find_request(
        &self,
        request_id: ApprovalRequestId,
    ) -> AppResult<Option<ApprovalRequest>> {
        Ok(self.request(request_id).await)
    }

    async fn list_requests(&self, query: ApprovalListQuery) -> AppResult<Vec<ApprovalRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .rev()
            .filter(|request| query.matches(request))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionalStore for FakeStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(FakeTransaction {
            guard,
            snapshot: Some(snapshot),
        }))
    }
}

struct FakeTransaction {
    guard: OwnedMutexGuard<FakeState>,
    snapshot: Option<FakeState>,
}

impl Drop for FakeTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl StoreTransaction for FakeTransaction {
    async fn insert_approval_request(&mut self, request: &ApprovalRequest) -> AppResult<()> {
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
        let product_id = ProductId::new(self.guard.allocate_id());
        let product = Product::new(product_id, product.name, product.sku, product.price)?;
        self.guard.products.insert(product_id, product.clone());
        Ok(product)
    }

    async fn update_product(&mut self, product: &Product) -> AppResult<()> {
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
            .employees
            .values()
            .any(|credentials| credentials.employee.email() == &employee.email)
        {
            return Err(AppError::Conflict("email already taken".to_owned()));
        }

        let employee_id = EmployeeId::new(self.guard.allocate_id());
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
        self.guard.principals.insert(
            employee_id,
            Principal::new(
                employee_id,
                employee.primary_role,
                employee.additional_roles,
                BTreeSet::new(),
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
            .ok_or_else(|| AppError::NotFound(format!("principal '{employee_id}' not found")))?;
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
        let principal = self
            .guard
            .principals
            .remove(&employee_id)
            .ok_or_else(|| AppError::NotFound(format!("principal '{employee_id}' not found")))?;
        self.guard.principals.insert(
            employee_id,
            Principal::new(
                employee_id,
                primary_role,
                additional_roles.iter().cloned(),
                principal.direct_permissions().iter().copied(),
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

/// Reversible stand-in for Argon2.
pub(crate) struct FakePasswordHasher;

impl FakePasswordHasher {
    pub(crate) fn hash(password: &str) -> String {
        format!("hashed:{password}")
    }
}

impl PasswordHasher for FakePasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(Self::hash(password))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(Self::hash(password) == hash)
    }
}
