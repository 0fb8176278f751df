use async_trait::async_trait;
use kasira_core::{AppResult, EmployeeId};
use kasira_domain::{Principal, Role};

/// Repository port for principal and role lookups.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds the authorization projection of an employee.
    async fn find_principal(&self, employee_id: EmployeeId) -> AppResult<Option<Principal>>;

    /// Lists every configured role with its grants.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Inserts roles that do not exist yet; existing roles are left untouched.
    async fn ensure_roles(&self, roles: &[Role]) -> AppResult<()>;
}
