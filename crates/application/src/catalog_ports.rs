use async_trait::async_trait;
use kasira_core::{AppResult, EmployeeId};
use kasira_domain::{Employee, Product, ProductId};

/// Employee plus the stored password hash, used only for sign-in.
#[derive(Debug, Clone)]
pub struct EmployeeCredentials {
    /// Employee account.
    pub employee: Employee,
    /// Argon2id password hash.
    pub password_hash: String,
}

/// Repository port for product reads.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Finds a product by id.
    async fn find_product(&self, product_id: ProductId) -> AppResult<Option<Product>>;
}

/// Repository port for employee reads.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Finds an employee by id.
    async fn find_employee(&self, employee_id: EmployeeId) -> AppResult<Option<Employee>>;

    /// Finds sign-in credentials by normalized email.
    async fn find_credentials_by_email(&self, email: &str)
    -> AppResult<Option<EmployeeCredentials>>;

    /// Counts every employee account.
    async fn count_employees(&self) -> AppResult<u64>;
}

/// Port for password hashing operations. Keeps the application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}
