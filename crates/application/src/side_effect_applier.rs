use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountAction, AccountStatus, ApprovalPayload, ApprovalRequest, AuditChanges, AuditEvent,
    AuditMetadata, AuditSubjectType, Price, ProductId, SubjectRef,
};
use tracing::warn;

use crate::{AuditLogEntry, AuditRecord, StoreTransaction};

/// Applies the business effect of a fully approved request.
///
/// Runs inside the caller's transaction; every failure is reported as
/// `SideEffectFailure` so the caller rolls back the terminal transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideEffectApplier;

impl SideEffectApplier {
    /// Applies the effect carried by the request payload.
    pub async fn apply(
        &self,
        transaction: &mut dyn StoreTransaction,
        request: &ApprovalRequest,
        causer_id: EmployeeId,
        metadata: AuditMetadata,
    ) -> AppResult<AuditLogEntry> {
        let result = match (request.subject(), request.payload()) {
            (SubjectRef::Product(product_id), ApprovalPayload::PriceChange { new_price, .. }) => {
                self.apply_price_change(transaction, product_id, *new_price, causer_id, metadata)
                    .await
            }
            (SubjectRef::Employee(employee_id), ApprovalPayload::Suspension { action, .. }) => {
                match action {
                    AccountAction::Suspend => {
                        self.apply_suspension(transaction, employee_id, causer_id, metadata)
                            .await
                    }
                    AccountAction::Activate => {
                        self.apply_activation(transaction, employee_id, causer_id, metadata)
                            .await
                    }
                }
            }
            (subject, _) => Err(AppError::Validation(format!(
                "{} request cannot target {} '{}'",
                request.workflow_type().as_str(),
                subject.subject_type().as_str(),
                subject.id()
            ))),
        };

        result.map_err(|error| {
            warn!(request_id = %request.id(), error = %error, "side effect failed");
            match error {
                AppError::SideEffectFailure(message) => AppError::SideEffectFailure(message),
                other => AppError::SideEffectFailure(format!(
                    "request '{}' could not be applied: {other}",
                    request.id()
                )),
            }
        })
    }

    /// Sets a product's price.
    pub async fn apply_price_change(
        &self,
        transaction: &mut dyn StoreTransaction,
        product_id: ProductId,
        new_price: i64,
        causer_id: EmployeeId,
        metadata: AuditMetadata,
    ) -> AppResult<AuditLogEntry> {
        let price = Price::new(new_price)?;
        let product = transaction
            .find_product_for_update(product_id)
            .await?
            .ok_or_else(|| {
                AppError::SideEffectFailure(format!("product '{product_id}' no longer exists"))
            })?;

        let before = product.audit_snapshot();
        let updated = product.with_price(price);
        transaction.update_product(&updated).await?;

        AuditRecord {
            event: AuditEvent::Updated,
            subject_type: AuditSubjectType::Product,
            subject_id: product_id.to_string(),
            causer_id: Some(causer_id),
            changes: AuditChanges::updated(&before, &updated.audit_snapshot())?,
            metadata,
        }
        .write(transaction)
        .await
    }

    /// Suspends an active account.
    pub async fn apply_suspension(
        &self,
        transaction: &mut dyn StoreTransaction,
        employee_id: EmployeeId,
        causer_id: EmployeeId,
        metadata: AuditMetadata,
    ) -> AppResult<AuditLogEntry> {
        self.set_account_status(
            transaction,
            employee_id,
            AccountStatus::Suspended,
            causer_id,
            metadata,
        )
        .await
    }

    /// Reactivates a suspended account.
    pub async fn apply_activation(
        &self,
        transaction: &mut dyn StoreTransaction,
        employee_id: EmployeeId,
        causer_id: EmployeeId,
        metadata: AuditMetadata,
    ) -> AppResult<AuditLogEntry> {
        self.set_account_status(
            transaction,
            employee_id,
            AccountStatus::Active,
            causer_id,
            metadata,
        )
        .await
    }

    async fn set_account_status(
        &self,
        transaction: &mut dyn StoreTransaction,
        employee_id: EmployeeId,
        account_status: AccountStatus,
        causer_id: EmployeeId,
        metadata: AuditMetadata,
    ) -> AppResult<AuditLogEntry> {
        let employee = transaction
            .find_employee_for_update(employee_id)
            .await?
            .ok_or_else(|| {
                AppError::SideEffectFailure(format!("employee '{employee_id}' no longer exists"))
            })?;
        if employee.account_status() == account_status {
            return Err(AppError::SideEffectFailure(format!(
                "employee '{employee_id}' is already {}",
                account_status.as_str()
            )));
        }

        let before = employee.audit_snapshot();
        let updated = employee.with_account_status(account_status);
        transaction
            .update_account_status(employee_id, account_status)
            .await?;

        AuditRecord {
            event: AuditEvent::Updated,
            subject_type: AuditSubjectType::Employee,
            subject_id: employee_id.to_string(),
            causer_id: Some(causer_id),
            changes: AuditChanges::updated(&before, &updated.audit_snapshot())?,
            metadata,
        }
        .write(transaction)
        .await
    }
}
