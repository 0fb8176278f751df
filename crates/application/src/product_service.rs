use std::sync::Arc;

use kasira_core::{AppError, AppResult};
use kasira_domain::{
    AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, Permission, Price, Product,
    ProductId,
};
use tracing::info;

use crate::{Actor, AuditRecord, NewProduct, ProductRepository, TransactionalStore};

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductInput {
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Initial price in minor units.
    pub price: i64,
}

/// Application service for product administration.
///
/// Prices are set once at creation; later changes go through the
/// price-change approval pipeline.
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    store: Arc<dyn TransactionalStore>,
}

impl ProductService {
    /// Creates a new product service.
    #[must_use]
    pub fn new(repository: Arc<dyn ProductRepository>, store: Arc<dyn TransactionalStore>) -> Self {
        Self { repository, store }
    }

    /// Finds a product.
    pub async fn find_product(&self, actor: &Actor, product_id: ProductId) -> AppResult<Product> {
        actor.require(Permission::ProductsView)?;

        self.repository
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product '{product_id}' not found")))
    }

    /// Creates a product.
    pub async fn create_product(
        &self,
        actor: &Actor,
        input: NewProductInput,
        metadata: AuditMetadata,
    ) -> AppResult<Product> {
        actor.require(Permission::ProductsManage)?;

        let price = Price::new(input.price)?;
        // Validates name and sku before touching storage.
        let draft = Product::new(ProductId::new(0), input.name, input.sku, price)?;

        let mut transaction = self.store.begin().await?;
        let product = transaction
            .insert_product(NewProduct {
                name: draft.name().to_owned(),
                sku: draft.sku().to_owned(),
                price,
            })
            .await?;

        AuditRecord {
            event: AuditEvent::Created,
            subject_type: AuditSubjectType::Product,
            subject_id: product.id().to_string(),
            causer_id: Some(actor.employee_id()),
            changes: AuditChanges::created(&product.audit_snapshot())?,
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(product_id = %product.id(), sku = product.sku(), "product created");
        Ok(product)
    }

    /// Updates a product's name and sku.
    pub async fn update_product_details(
        &self,
        actor: &Actor,
        product_id: ProductId,
        name: &str,
        sku: &str,
        metadata: AuditMetadata,
    ) -> AppResult<Product> {
        actor.require(Permission::ProductsManage)?;

        let mut transaction = self.store.begin().await?;
        let product = transaction
            .find_product_for_update(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product '{product_id}' not found")))?;

        let before = product.audit_snapshot();
        let updated = product.with_details(name, sku)?;
        let changes = AuditChanges::updated(&before, &updated.audit_snapshot())?;
        if changes.is_empty() {
            return Ok(updated);
        }

        transaction.update_product(&updated).await?;

        AuditRecord {
            event: AuditEvent::Updated,
            subject_type: AuditSubjectType::Product,
            subject_id: product_id.to_string(),
            causer_id: Some(actor.employee_id()),
            changes,
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(product_id = %product_id, "product details updated");
        Ok(updated)
    }
}
