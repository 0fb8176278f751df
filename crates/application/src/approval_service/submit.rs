use chrono::Utc;
use kasira_domain::{
    AccountAction, AccountStatus, ApprovalPayload, AuditChanges, AuditEvent, AuditMetadata,
    AuditSubjectType, SubjectRef,
};
use tracing::info;

use crate::AuditRecord;

use super::*;

impl ApprovalService {
    /// Submits a new request in its pipeline's initial status.
    ///
    /// The subject is locked while the request is written so the captured
    /// old price matches the stored one.
    pub async fn submit(
        &self,
        actor: &Actor,
        proposal: ApprovalProposal,
        metadata: AuditMetadata,
    ) -> AppResult<ApprovalRequest> {
        let required = match proposal {
            ApprovalProposal::PriceChange { .. } => Permission::PriceChangesRequest,
            ApprovalProposal::Suspension { .. } => Permission::SuspensionRequest,
        };
        actor.require(required)?;

        let mut transaction = self.store.begin().await?;

        let (subject, payload) = match proposal {
            ApprovalProposal::PriceChange {
                product_id,
                new_price,
                reason,
            } => {
                let product = transaction
                    .find_product_for_update(product_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("product '{product_id}' not found"))
                    })?;

                (
                    SubjectRef::Product(product_id),
                    ApprovalPayload::PriceChange {
                        old_price: product.price().amount(),
                        new_price,
                        reason,
                    },
                )
            }
            ApprovalProposal::Suspension {
                employee_id,
                reason,
                action,
            } => {
                if employee_id == actor.employee_id() {
                    return Err(AppError::Validation(
                        "employees cannot request a status change of their own account".to_owned(),
                    ));
                }

                let employee = transaction
                    .find_employee_for_update(employee_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("employee '{employee_id}' not found"))
                    })?;

                let target = match action {
                    AccountAction::Suspend => AccountStatus::Suspended,
                    AccountAction::Activate => AccountStatus::Active,
                };
                if employee.account_status() == target {
                    return Err(AppError::Validation(format!(
                        "employee '{employee_id}' is already {}",
                        target.as_str()
                    )));
                }

                (
                    SubjectRef::Employee(employee_id),
                    ApprovalPayload::Suspension { reason, action },
                )
            }
        };

        let request = ApprovalRequest::submit(subject, payload, actor.employee_id(), Utc::now())?;
        transaction.insert_approval_request(&request).await?;

        AuditRecord {
            event: AuditEvent::Created,
            subject_type: AuditSubjectType::ApprovalRequest,
            subject_id: request.id().to_string(),
            causer_id: Some(actor.employee_id()),
            changes: AuditChanges::created(&request.audit_snapshot())?,
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(
            request_id = %request.id(),
            workflow_type = request.workflow_type().as_str(),
            requested_by = %actor.employee_id(),
            "approval request submitted"
        );

        Ok(request)
    }
}
