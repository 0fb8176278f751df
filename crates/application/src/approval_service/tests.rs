use std::sync::Arc;

use async_trait::async_trait;
use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AccountAction, AccountStatus, ApprovalRequest, ApprovalRequestId, ApprovalStatus, AuditEvent,
    AuditMetadata, AuditSubjectType, Decision, DefaultRole, ProductId, SubjectRef, WorkflowType,
};
use serde_json::json;

use crate::test_support::FakeStore;
use crate::{ApprovalListQuery, ApprovalRepository};

use super::{AdvanceInput, ApprovalProposal, ApprovalService};

fn approve() -> AdvanceInput {
    AdvanceInput {
        decision: Decision::Approve,
        note: None,
        expected_status: None,
    }
}

fn reject(note: &str) -> AdvanceInput {
    AdvanceInput {
        decision: Decision::Reject,
        note: Some(note.to_owned()),
        expected_status: None,
    }
}

fn price_change(product_id: i64, new_price: i64) -> ApprovalProposal {
    ApprovalProposal::PriceChange {
        product_id: ProductId::new(product_id),
        new_price,
        reason: "supplier raised cost".to_owned(),
    }
}

fn suspension(employee_id: EmployeeId, reason: &str) -> ApprovalProposal {
    ApprovalProposal::Suspension {
        employee_id,
        reason: reason.to_owned(),
        action: AccountAction::Suspend,
    }
}

async fn submit(
    store: &FakeStore,
    employee_id: EmployeeId,
    proposal: ApprovalProposal,
) -> AppResult<ApprovalRequest> {
    let actor = store.actor(employee_id).await;
    store
        .services()
        .approvals
        .submit(&actor, proposal, AuditMetadata::default())
        .await
}

/// Submits a 1000 -> 1200 price change for product 7.
async fn submit_price_change(store: &FakeStore, employee_id: EmployeeId) -> ApprovalRequestId {
    submit(store, employee_id, price_change(7, 1200))
        .await
        .map(|request| request.id())
        .unwrap_or_default()
}

async fn decide(
    store: &FakeStore,
    employee_id: EmployeeId,
    request_id: ApprovalRequestId,
    input: AdvanceInput,
) -> AppResult<ApprovalRequest> {
    let actor = store.actor(employee_id).await;
    store
        .services()
        .approvals
        .advance(&actor, request_id, input, AuditMetadata::default())
        .await
}

async fn status_of(store: &FakeStore, request_id: ApprovalRequestId) -> Option<ApprovalStatus> {
    store
        .request(request_id)
        .await
        .map(|request| request.status())
}

async fn history_len(store: &FakeStore, request_id: ApprovalRequestId) -> Option<usize> {
    store
        .request(request_id)
        .await
        .map(|request| request.stage_history().len())
}

async fn price_of(store: &FakeStore, product_id: ProductId) -> Option<i64> {
    store
        .product(product_id)
        .await
        .map(|product| product.price().amount())
}

#[tokio::test]
async fn price_change_applies_after_finance_and_owner_approve() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let product_id = store.seed_product(7, 1000).await;

    let request = submit(&store, staff, price_change(7, 1200)).await;
    assert!(request.is_ok());
    let request_id = request.map(|request| request.id()).unwrap_or_default();

    let after_finance = decide(&store, finance, request_id, approve()).await;
    assert_eq!(
        after_finance.map(|request| request.status()).ok(),
        Some(ApprovalStatus::FinanceApproved)
    );
    assert_eq!(price_of(&store, product_id).await, Some(1000));

    let after_owner = decide(&store, owner, request_id, approve()).await;
    assert_eq!(
        after_owner.as_ref().map(|request| request.status()).ok(),
        Some(ApprovalStatus::OwnerApproved)
    );
    assert_eq!(
        after_owner
            .map(|request| request.stage_history().len())
            .ok(),
        Some(2)
    );
    assert_eq!(price_of(&store, product_id).await, Some(1200));

    let entries = store.audit_entries().await;
    let product_entries: Vec<_> = entries
        .iter()
        .filter(|entry| entry.subject_type == AuditSubjectType::Product)
        .collect();
    assert_eq!(product_entries.len(), 1);
    assert_eq!(
        product_entries[0]
            .changes
            .get("price")
            .map(|change| (change.old.clone(), change.new.clone())),
        Some((Some(json!(1000)), Some(json!(1200))))
    );

    let decisions = entries
        .iter()
        .filter(|entry| entry.event == AuditEvent::Approved)
        .count();
    assert_eq!(decisions, 2);
    assert_eq!(entries[0].event, AuditEvent::Created);
}

#[tokio::test]
async fn submit_captures_old_price_from_product() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request = submit(&store, staff, price_change(7, 1200)).await;

    let payload = request.map(|request| request.payload().to_value()).ok();
    assert_eq!(
        payload,
        Some(json!({"old_price": 1000, "new_price": 1200, "reason": "supplier raised cost"}))
    );
}

#[tokio::test]
async fn submit_rejects_unchanged_price_and_missing_product() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let unchanged = submit(&store, staff, price_change(7, 1000)).await;
    assert!(matches!(unchanged, Err(AppError::Validation(_))));

    let missing = submit(&store, staff, price_change(99, 1000)).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    assert!(store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn submit_requires_request_permission() {
    let store = FakeStore::with_default_roles().await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let result = submit(&store, finance, price_change(7, 1200)).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn owner_rejection_without_note_is_rejected_and_status_stays() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;
    let _ = decide(&store, finance, request_id, approve()).await;
    let audit_before = store.audit_entries().await.len();

    let result = decide(&store, owner, request_id, reject("   ")).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::FinanceApproved)
    );
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn suspension_owner_rejection_leaves_account_untouched() {
    let store = FakeStore::with_default_roles().await;
    let hr = store.seed_employee(1, DefaultRole::Hr, &[], &[]).await;
    let manager = store.seed_employee(2, DefaultRole::Manager, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let target = store.seed_employee(42, DefaultRole::Staff, &[], &[]).await;

    let request_id = submit(&store, hr, suspension(target, "repeated no-shows"))
        .await
        .map(|request| request.id())
        .unwrap_or_default();

    let after_manager = decide(&store, manager, request_id, approve()).await;
    assert_eq!(
        after_manager.map(|request| request.status()).ok(),
        Some(ApprovalStatus::ManagerApproved)
    );

    let after_owner = decide(&store, owner, request_id, reject("talked it through")).await;
    let history = after_owner
        .as_ref()
        .map(|request| request.stage_history().to_vec());
    assert_eq!(
        after_owner.as_ref().map(|request| request.status()).ok(),
        Some(ApprovalStatus::OwnerRejected)
    );
    assert_eq!(
        history
            .ok()
            .and_then(|history| history.last().and_then(|record| record.note.clone())),
        Some("talked it through".to_owned())
    );
    assert_eq!(
        store
            .employee(target)
            .await
            .map(|employee| employee.account_status()),
        Some(AccountStatus::Active)
    );

    let rejected = store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| entry.event == AuditEvent::Rejected)
        .count();
    assert_eq!(rejected, 1);
}

#[tokio::test]
async fn suspension_owner_approval_suspends_account() {
    let store = FakeStore::with_default_roles().await;
    let hr = store.seed_employee(1, DefaultRole::Hr, &[], &[]).await;
    let manager = store.seed_employee(2, DefaultRole::Manager, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let target = store.seed_employee(42, DefaultRole::Staff, &[], &[]).await;

    let request_id = submit(&store, hr, suspension(target, "policy breach"))
        .await
        .map(|request| request.id())
        .unwrap_or_default();
    for approver in [manager, owner] {
        let result = decide(&store, approver, request_id, approve()).await;
        assert!(result.is_ok());
    }

    assert_eq!(
        store
            .employee(target)
            .await
            .map(|employee| employee.account_status()),
        Some(AccountStatus::Suspended)
    );
    let employee_updates = store
        .audit_entries()
        .await
        .into_iter()
        .filter(|entry| {
            entry.subject_type == AuditSubjectType::Employee && entry.event == AuditEvent::Updated
        })
        .count();
    assert_eq!(employee_updates, 1);
}

#[tokio::test]
async fn suspension_of_own_account_is_rejected() {
    let store = FakeStore::with_default_roles().await;
    let hr = store.seed_employee(1, DefaultRole::Hr, &[], &[]).await;

    let result = submit(&store, hr, suspension(hr, "testing")).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn requester_cannot_decide_their_own_request() {
    let store = FakeStore::with_default_roles().await;
    let manager = store.seed_employee(1, DefaultRole::Manager, &[], &[]).await;
    let target = store.seed_employee(42, DefaultRole::Staff, &[], &[]).await;

    let request_id = submit(&store, manager, suspension(target, "late again"))
        .await
        .map(|request| request.id())
        .unwrap_or_default();
    let audit_before = store.audit_entries().await.len();

    let result = decide(&store, manager, request_id, approve()).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::Pending)
    );
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn earlier_stage_decider_cannot_decide_a_later_stage() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let co_owner = store.seed_employee(4, DefaultRole::Owner, &[], &[]).await;
    let product_id = store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;
    let after_finance = decide(&store, owner, request_id, approve()).await;
    assert!(after_finance.is_ok());
    let audit_before = store.audit_entries().await.len();

    let same_decider = decide(&store, owner, request_id, approve()).await;

    assert!(matches!(same_decider, Err(AppError::Forbidden(_))));
    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::FinanceApproved)
    );
    assert_eq!(price_of(&store, product_id).await, Some(1000));
    assert_eq!(store.audit_entries().await.len(), audit_before);

    let other_owner = decide(&store, co_owner, request_id, approve()).await;
    assert_eq!(
        other_owner.map(|request| request.status()).ok(),
        Some(ApprovalStatus::OwnerApproved)
    );
    assert_eq!(price_of(&store, product_id).await, Some(1200));
}

#[tokio::test]
async fn competing_finance_approvers_produce_one_winner() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let first = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let second = store.seed_employee(3, DefaultRole::Finance, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;

    let seen = AdvanceInput {
        expected_status: Some(ApprovalStatus::Pending),
        ..approve()
    };
    let (left, right) = tokio::join!(
        decide(&store, first, request_id, seen.clone()),
        decide(&store, second, request_id, seen.clone()),
    );

    let outcomes = [left, right];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Err(AppError::Conflict(_))))
            .count(),
        1
    );
    assert_eq!(history_len(&store, request_id).await, Some(1));
}

#[tokio::test]
async fn racing_approve_and_reject_settle_on_the_winner() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let approver = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let rejecter = store.seed_employee(3, DefaultRole::Finance, &[], &[]).await;
    let product_id = store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;

    let approval = AdvanceInput {
        expected_status: Some(ApprovalStatus::Pending),
        ..approve()
    };
    let rejection = AdvanceInput {
        expected_status: Some(ApprovalStatus::Pending),
        ..reject("margin too thin")
    };
    let (approved, rejected) = tokio::join!(
        decide(&store, approver, request_id, approval),
        decide(&store, rejecter, request_id, rejection),
    );

    assert!(approved.is_ok() != rejected.is_ok());
    let loser = if approved.is_ok() { &rejected } else { &approved };
    assert!(matches!(loser, Err(AppError::Conflict(_))));

    let expected = if approved.is_ok() {
        ApprovalStatus::FinanceApproved
    } else {
        ApprovalStatus::FinanceRejected
    };
    assert_eq!(status_of(&store, request_id).await, Some(expected));
    assert_eq!(history_len(&store, request_id).await, Some(1));
    assert_eq!(price_of(&store, product_id).await, Some(1000));
}

/// Serves a copy of the request as it looked before a competing decision.
struct StaleApprovalRepository {
    request: ApprovalRequest,
}

#[async_trait]
impl ApprovalRepository for StaleApprovalRepository {
    async fn find_request(
        &self,
        _request_id: ApprovalRequestId,
    ) -> AppResult<Option<ApprovalRequest>> {
        Ok(Some(self.request.clone()))
    }

    async fn list_requests(&self, _query: ApprovalListQuery) -> AppResult<Vec<ApprovalRequest>> {
        Ok(vec![self.request.clone()])
    }
}

#[tokio::test]
async fn stale_status_loses_compare_and_set() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let first = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let second = store.seed_employee(3, DefaultRole::Finance, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let submitted = submit(&store, staff, price_change(7, 1200)).await;
    let Ok(submitted) = submitted else {
        panic!("submission failed");
    };
    let winner = decide(&store, first, submitted.id(), approve()).await;
    assert!(winner.is_ok());

    let stale_service = ApprovalService::new(
        Arc::new(StaleApprovalRepository {
            request: submitted.clone(),
        }),
        Arc::new(store.clone()),
    );
    let audit_before = store.audit_entries().await.len();

    let loser = stale_service
        .advance(
            &store.actor(second).await,
            submitted.id(),
            approve(),
            AuditMetadata::default(),
        )
        .await;

    assert!(matches!(loser, Err(AppError::Conflict(_))));
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn rejected_request_cannot_advance() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;
    let rejected = decide(&store, finance, request_id, reject("not this quarter")).await;
    assert_eq!(
        rejected.map(|request| request.status()).ok(),
        Some(ApprovalStatus::FinanceRejected)
    );
    let audit_before = store.audit_entries().await.len();

    let again = decide(&store, owner, request_id, approve()).await;

    assert!(matches!(again, Err(AppError::InvalidTransition(_))));
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn approved_request_is_never_applied_twice() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let co_owner = store.seed_employee(4, DefaultRole::Owner, &[], &[]).await;
    let product_id = store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;
    for approver in [finance, owner] {
        let result = decide(&store, approver, request_id, approve()).await;
        assert!(result.is_ok());
    }
    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::OwnerApproved)
    );
    let audit_before = store.audit_entries().await.len();

    for approver in [owner, co_owner] {
        let replay = decide(&store, approver, request_id, approve()).await;
        assert!(matches!(replay, Err(AppError::InvalidTransition(_))));
    }
    let late_rejection = decide(&store, co_owner, request_id, reject("too late")).await;
    assert!(matches!(late_rejection, Err(AppError::InvalidTransition(_))));

    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::OwnerApproved)
    );
    assert_eq!(price_of(&store, product_id).await, Some(1200));
    assert_eq!(history_len(&store, request_id).await, Some(2));
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn stage_permission_is_enforced() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;

    let by_staff = decide(&store, staff, request_id, approve()).await;
    assert!(matches!(by_staff, Err(AppError::Forbidden(_))));

    let _ = decide(&store, finance, request_id, approve()).await;
    let finance_again = decide(&store, finance, request_id, approve()).await;
    assert!(matches!(finance_again, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn expected_status_mismatch_is_conflict() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;

    let result = decide(
        &store,
        owner,
        request_id,
        AdvanceInput {
            expected_status: Some(ApprovalStatus::FinanceApproved),
            ..approve()
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn side_effect_failure_rolls_back_final_transition() {
    let store = FakeStore::with_default_roles().await;
    let staff = store.seed_employee(1, DefaultRole::Staff, &[], &[]).await;
    let finance = store.seed_employee(2, DefaultRole::Finance, &[], &[]).await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;
    let product_id = store.seed_product(7, 1000).await;

    let request_id = submit_price_change(&store, staff).await;
    let _ = decide(&store, finance, request_id, approve()).await;
    store.remove_product(product_id).await;
    let audit_before = store.audit_entries().await.len();

    let result = decide(&store, owner, request_id, approve()).await;

    assert!(matches!(result, Err(AppError::SideEffectFailure(_))));
    assert_eq!(
        status_of(&store, request_id).await,
        Some(ApprovalStatus::FinanceApproved)
    );
    assert_eq!(history_len(&store, request_id).await, Some(1));
    assert_eq!(store.audit_entries().await.len(), audit_before);
}

#[tokio::test]
async fn list_filters_and_requires_view_permission() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let manager = store.seed_employee(1, DefaultRole::Manager, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;
    let target = store.seed_employee(42, DefaultRole::Staff, &[], &[]).await;
    store.seed_product(7, 1000).await;
    store.seed_product(8, 500).await;
    let manager_actor = store.actor(manager).await;

    for (product_id, price) in [(7, 1100), (8, 600)] {
        let _ = submit(&store, manager, price_change(product_id, price)).await;
    }
    let _ = submit(&store, manager, suspension(target, "misconduct")).await;

    let price_changes = services
        .approvals
        .list(
            &manager_actor,
            ApprovalListQuery {
                limit: 10,
                offset: 0,
                workflow_type: Some(WorkflowType::PriceChange),
                status: Some(ApprovalStatus::Pending),
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(price_changes.len(), 2);
    assert_eq!(
        price_changes[0].subject(),
        SubjectRef::Product(ProductId::new(8))
    );

    let second_page = services
        .approvals
        .list(
            &manager_actor,
            ApprovalListQuery {
                limit: 1,
                offset: 1,
                workflow_type: None,
                status: None,
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(second_page.len(), 1);

    let denied = services
        .approvals
        .list(
            &store.actor(staff).await,
            ApprovalListQuery {
                limit: 10,
                offset: 0,
                workflow_type: None,
                status: None,
            },
        )
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn find_reports_missing_request() {
    let store = FakeStore::with_default_roles().await;
    let owner = store.seed_employee(3, DefaultRole::Owner, &[], &[]).await;

    let result = store
        .services()
        .approvals
        .find(&store.actor(owner).await, ApprovalRequestId::new())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
