use super::*;

impl PostgresStoreTransaction {
    pub(super) async fn find_product_for_update_impl(
        &mut self,
        product_id: ProductId,
    ) -> AppResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, sku, price
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock product: {error}")))?
        .map(ProductRow::into_product)
        .transpose()
    }

    pub(super) async fn insert_product_impl(&mut self, product: NewProduct) -> AppResult<Product> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, sku, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, sku, price
            "#,
        )
        .bind(product.name.as_str())
        .bind(product.sku.as_str())
        .bind(product.price.amount())
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                &format!("a product with sku '{}' already exists", product.sku),
                "insert product",
            )
        })?
        .into_product()
    }

    pub(super) async fn update_product_impl(&mut self, product: &Product) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, sku = $3, price = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product.id().as_i64())
        .bind(product.name())
        .bind(product.sku())
        .bind(product.price().amount())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                &format!("a product with sku '{}' already exists", product.sku()),
                "update product",
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "product '{}' not found",
                product.id()
            )));
        }

        Ok(())
    }

    pub(super) async fn find_employee_for_update_impl(
        &mut self,
        employee_id: EmployeeId,
    ) -> AppResult<Option<Employee>> {
        sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT id, display_name, email, password_hash, account_status
            FROM employees
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(employee_id.as_i64())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock employee: {error}")))?
        .map(EmployeeRow::into_employee)
        .transpose()
    }

    pub(super) async fn insert_employee_impl(
        &mut self,
        employee: NewEmployee,
    ) -> AppResult<Employee> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            r#"
            INSERT INTO employees (display_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, display_name, email, password_hash, account_status
            "#,
        )
        .bind(employee.display_name.as_str())
        .bind(employee.email.as_str())
        .bind(employee.password_hash.as_str())
        .fetch_one(&mut *self.transaction)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                &format!(
                    "an employee with email '{}' already exists",
                    employee.email.as_str()
                ),
                "insert employee",
            )
        })?;
        let created = row.into_employee()?;

        self.replace_roles_impl(
            created.id(),
            &employee.primary_role,
            &employee.additional_roles,
        )
        .await?;

        Ok(created)
    }

    pub(super) async fn update_account_status_impl(
        &mut self,
        employee_id: EmployeeId,
        account_status: AccountStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET account_status = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(employee_id.as_i64())
        .bind(account_status.as_str())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update account status: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "employee '{employee_id}' not found"
            )));
        }

        Ok(())
    }
}
