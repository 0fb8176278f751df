use super::*;

impl PostgresStoreTransaction {
    pub(super) async fn find_principal_for_update_impl(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Principal>> {
        let locked = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id
            FROM employees
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(employee_id.as_i64())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock principal: {error}")))?;

        if locked.is_none() {
            return Ok(None);
        }

        fetch_principal(&mut self.transaction, employee_id).await
    }

    pub(super) async fn replace_direct_permissions_impl(
        &mut self,
        employee_id: EmployeeId,
        permissions: &BTreeSet<Permission>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM employee_direct_permissions
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id.as_i64())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear direct permissions: {error}"))
        })?;

        for permission in permissions {
            sqlx::query(
                r#"
                INSERT INTO employee_direct_permissions (employee_id, permission)
                VALUES ($1, $2)
                "#,
            )
            .bind(employee_id.as_i64())
            .bind(permission.as_str())
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist direct permission: {error}"))
            })?;
        }

        Ok(())
    }

    pub(super) async fn replace_roles_impl(
        &mut self,
        employee_id: EmployeeId,
        primary_role: &str,
        additional_roles: &BTreeSet<String>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM employee_roles
            WHERE employee_id = $1
            "#,
        )
        .bind(employee_id.as_i64())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear roles: {error}")))?;

        let assignments = std::iter::once((primary_role, true)).chain(
            additional_roles
                .iter()
                .filter(|role| role.as_str() != primary_role)
                .map(|role| (role.as_str(), false)),
        );
        for (role_name, is_primary) in assignments {
            sqlx::query(
                r#"
                INSERT INTO employee_roles (employee_id, role_name, is_primary)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(employee_id.as_i64())
            .bind(role_name)
            .bind(is_primary)
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;
        }

        Ok(())
    }
}
