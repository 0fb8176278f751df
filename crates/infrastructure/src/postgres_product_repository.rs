use async_trait::async_trait;
use kasira_application::ProductRepository;
use kasira_core::{AppError, AppResult};
use kasira_domain::{Product, ProductId};
use sqlx::PgPool;

use crate::postgres_rows::ProductRow;

/// PostgreSQL-backed product lookups.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn find_product(&self, product_id: ProductId) -> AppResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, sku, price
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find product: {error}")))?
        .map(ProductRow::into_product)
        .transpose()
    }
}
