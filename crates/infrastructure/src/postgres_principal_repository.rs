use std::collections::BTreeMap;

use async_trait::async_trait;
use kasira_application::PrincipalRepository;
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{Principal, Role};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::postgres_rows::{fetch_principal, parse_stored_permissions};

/// PostgreSQL-backed repository for roles and principals.
#[derive(Clone)]
pub struct PostgresPrincipalRepository {
    pool: PgPool,
}

impl PostgresPrincipalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    name: String,
    permission: Option<String>,
}

#[async_trait]
impl PrincipalRepository for PostgresPrincipalRepository {
    async fn find_principal(&self, employee_id: EmployeeId) -> AppResult<Option<Principal>> {
        let mut connection = self.pool.acquire().await.map_err(|error| {
            AppError::Internal(format!("failed to acquire connection: {error}"))
        })?;

        fetch_principal(&mut connection, employee_id).await
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT role.name, grant_row.permission
            FROM rbac_roles role
            LEFT JOIN rbac_role_grants grant_row ON grant_row.role_name = role.name
            ORDER BY role.name, grant_row.permission
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let permissions = grouped.entry(row.name).or_default();
            if let Some(permission) = row.permission {
                permissions.push(permission);
            }
        }

        grouped
            .into_iter()
            .map(|(name, permissions)| Role::new(name, parse_stored_permissions(permissions)))
            .collect()
    }

    async fn ensure_roles(&self, roles: &[Role]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for role in roles {
            let inserted = sqlx::query_scalar::<_, String>(
                r#"
                INSERT INTO rbac_roles (name)
                VALUES ($1)
                ON CONFLICT (name) DO NOTHING
                RETURNING name
                "#,
            )
            .bind(role.name())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to seed role: {error}")))?;

            // Grants of roles that already exist are left as configured.
            if inserted.is_none() {
                continue;
            }

            for permission in role.permissions() {
                sqlx::query(
                    r#"
                    INSERT INTO rbac_role_grants (role_name, permission)
                    VALUES ($1, $2)
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(role.name())
                .bind(permission.as_str())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to seed role grant: {error}"))
                })?;
            }

            info!(role = role.name(), "seeded role");
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}
