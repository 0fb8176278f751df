//! Approval pipeline orchestration.
//!
//! Submission and every stage decision run in one store transaction with
//! their audit entries. The terminal approval also applies the side effect
//! in that same transaction, so the effect happens exactly once or not at
//! all.

use std::sync::Arc;

use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountAction, ApprovalRequest, ApprovalRequestId, ApprovalStatus, Decision, Permission,
    ProductId,
};

use crate::{
    Actor, ApprovalListQuery, ApprovalRepository, SideEffectApplier, TransactionalStore,
    clamp_page_limit,
};

mod advance;
mod submit;

/// Change proposed by a submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalProposal {
    /// Change a product's price.
    PriceChange {
        /// Product whose price changes.
        product_id: ProductId,
        /// Proposed price in minor units.
        new_price: i64,
        /// Business justification.
        reason: String,
    },
    /// Suspend or reactivate an employee account.
    Suspension {
        /// Employee whose account changes.
        employee_id: EmployeeId,
        /// Justification shown to approvers.
        reason: String,
        /// Change applied on final approval.
        action: AccountAction,
    },
}

/// Stage decision submitted by an approver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceInput {
    /// Approve or reject.
    pub decision: Decision,
    /// Approver note; mandatory for rejections.
    pub note: Option<String>,
    /// Status the approver saw; a mismatch fails with `Conflict`.
    pub expected_status: Option<ApprovalStatus>,
}

/// Application service driving approval requests through their pipelines.
#[derive(Clone)]
pub struct ApprovalService {
    repository: Arc<dyn ApprovalRepository>,
    store: Arc<dyn TransactionalStore>,
    side_effects: SideEffectApplier,
}

impl ApprovalService {
    /// Creates a new approval service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ApprovalRepository>,
        store: Arc<dyn TransactionalStore>,
    ) -> Self {
        Self {
            repository,
            store,
            side_effects: SideEffectApplier,
        }
    }

    /// Lists requests newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        query: ApprovalListQuery,
    ) -> AppResult<Vec<ApprovalRequest>> {
        actor.require(Permission::ApprovalsView)?;

        self.repository
            .list_requests(ApprovalListQuery {
                limit: clamp_page_limit(query.limit),
                ..query
            })
            .await
    }

    /// Finds one request.
    pub async fn find(
        &self,
        actor: &Actor,
        request_id: ApprovalRequestId,
    ) -> AppResult<ApprovalRequest> {
        actor.require(Permission::ApprovalsView)?;
        self.load(request_id).await
    }

    async fn load(&self, request_id: ApprovalRequestId) -> AppResult<ApprovalRequest> {
        self.repository
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("approval request '{request_id}' not found")))
    }
}

#[cfg(test)]
mod tests;
