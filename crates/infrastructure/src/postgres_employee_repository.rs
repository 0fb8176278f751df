use async_trait::async_trait;
use kasira_application::{EmployeeCredentials, EmployeeRepository};
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::Employee;
use sqlx::PgPool;

use crate::postgres_rows::EmployeeRow;

/// PostgreSQL-backed employee lookups.
#[derive(Clone)]
pub struct PostgresEmployeeRepository {
    pool: PgPool,
}

impl PostgresEmployeeRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PostgresEmployeeRepository {
    async fn find_employee(&self, employee_id: EmployeeId) -> AppResult<Option<Employee>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, display_name, email, password_hash, account_status
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(employee_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find employee: {error}")))?
        .map(EmployeeRow::into_employee)
        .transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<EmployeeCredentials>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, display_name, email, password_hash, account_status
            FROM employees
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find employee by email: {error}")))?
        .map(EmployeeRow::into_credentials)
        .transpose()
    }

    async fn count_employees(&self) -> AppResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count employees: {error}")))?;

        u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid employee count: {error}")))
    }
}
