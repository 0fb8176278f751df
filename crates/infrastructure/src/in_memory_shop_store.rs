use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use kasira_application::{
    ApprovalListQuery, ApprovalRepository, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    EmployeeCredentials, EmployeeRepository, PrincipalRepository, ProductRepository,
    StoreTransaction, TransactionalStore, clamp_page_limit,
};
use kasira_core::{AppResult, EmployeeId};
use kasira_domain::{
    ApprovalRequest, ApprovalRequestId, Employee, Principal, Product, ProductId, Role,
};
use tokio::sync::Mutex;

mod transaction;


use transaction::InMemoryStoreTransaction;

#[derive(Debug, Clone, Default)]
struct ShopState {
    roles: BTreeMap<String, Role>,
    employees: BTreeMap<EmployeeId, EmployeeCredentials>,
    principals: BTreeMap<EmployeeId, Principal>,
    products: BTreeMap<ProductId, Product>,
    requests: Vec<ApprovalRequest>,
    audit_entries: Vec<AuditLogEntry>,
    next_employee_id: i64,
    next_product_id: i64,
}

impl ShopState {
    fn employee_email_taken(&self, email: &str, except: Option<EmployeeId>) -> bool {
        self.employees.values().any(|credentials| {
            credentials.employee.email().as_str() == email
                && Some(credentials.employee.id()) != except
        })
    }

    fn sku_taken(&self, sku: &str, except: Option<ProductId>) -> bool {
        self.products
            .values()
            .any(|product| product.sku() == sku && Some(product.id()) != except)
    }
}

/// In-memory store implementing every persistence port.
///
/// One mutex guards the whole shop; a transaction holds it until commit or
/// drop, and a dropped transaction restores the state it started from.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShopStore {
    state: Arc<Mutex<ShopState>>,
}

impl InMemoryShopStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionalStore for InMemoryShopStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryStoreTransaction::new(guard)))
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryShopStore {
    async fn find_principal(&self, employee_id: EmployeeId) -> AppResult<Option<Principal>> {
        Ok(self.state.lock().await.principals.get(&employee_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.state.lock().await.roles.values().cloned().collect())
    }

    async fn ensure_roles(&self, roles: &[Role]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for role in roles {
            state
                .roles
                .entry(role.name().to_owned())
                .or_insert_with(|| role.clone());
        }

        Ok(())
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryShopStore {
    async fn find_employee(&self, employee_id: EmployeeId) -> AppResult<Option<Employee>> {
        Ok(self
            .state
            .lock()
            .await
            .employees
            .get(&employee_id)
            .map(|credentials| credentials.employee.clone()))
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
impl ProductRepository for InMemoryShopStore {
    async fn find_product(&self, product_id: ProductId) -> AppResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl ApprovalRepository for InMemoryShopStore {
    async fn find_request(
        &self,
        request_id: ApprovalRequestId,
    ) -> AppResult<Option<ApprovalRequest>> {
        Ok(self
            .state
            .lock()
            .await
            .requests
            .iter()
            .find(|request| request.id() == request_id)
            .cloned())
    }

    async fn list_requests(&self, query: ApprovalListQuery) -> AppResult<Vec<ApprovalRequest>> {
        let state = self.state.lock().await;
        let mut requests: Vec<&ApprovalRequest> = state
            .requests
            .iter()
            .filter(|request| query.matches(request))
            .collect();
        requests.sort_by(|left, right| right.requested_at().cmp(&left.requested_at()));

        Ok(requests
            .into_iter()
            .skip(query.offset)
            .take(clamp_page_limit(query.limit))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryShopStore {
    async fn list_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<&AuditLogEntry> = state
            .audit_entries
            .iter()
            .filter(|entry| query.matches(entry))
            .collect();
        entries.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        Ok(entries
            .into_iter()
            .skip(query.offset)
            .take(clamp_page_limit(query.limit))
            .cloned()
            .collect())
    }
}

fn role_set(primary_role: &str, additional_roles: &BTreeSet<String>) -> BTreeSet<String> {
    additional_roles
        .iter()
        .filter(|role| role.as_str() != primary_role)
        .cloned()
        .collect()
}
