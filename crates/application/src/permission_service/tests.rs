use std::collections::BTreeSet;

use kasira_core::AppError;
use kasira_domain::{AuditEvent, AuditMetadata, AuditSubjectType, DefaultRole, Permission};
use proptest::prelude::*;
use serde_json::json;

use crate::test_support::FakeStore;

#[tokio::test]
async fn sync_adds_and_removes_direct_grants_with_one_audit_entry() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store
        .seed_employee(2, DefaultRole::Staff, &[], &[Permission::EmployeesView])
        .await;

    let result = services
        .permissions
        .sync_direct_permissions(
            &store.actor(owner).await,
            staff,
            &["products.view", "audit_log.view", "approvals.view"],
            AuditMetadata::default(),
        )
        .await;

    let effective = result.unwrap_or_default();
    assert_eq!(
        effective.direct(),
        &BTreeSet::from([Permission::ApprovalsView, Permission::AuditLogView])
    );
    assert!(effective.role_derived().contains(&Permission::ProductsView));

    let entries = store.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event, AuditEvent::Updated);
    assert_eq!(entries[0].subject_type, AuditSubjectType::Principal);
    assert_eq!(entries[0].subject_id, "2");
    let change = entries[0].changes.get("direct_permissions");
    assert_eq!(
        change.map(|change| (change.old.clone(), change.new.clone())),
        Some((
            Some(json!(["employees.view"])),
            Some(json!(["approvals.view", "audit_log.view"]))
        ))
    );
}

#[tokio::test]
async fn role_derived_permission_survives_sync_that_omits_it() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;

    let result = services
        .permissions
        .sync_direct_permissions(
            &store.actor(owner).await,
            staff,
            &Vec::<String>::new(),
            AuditMetadata::default(),
        )
        .await;

    let effective = result.unwrap_or_default();
    assert!(effective.contains(Permission::ProductsView));
    assert!(effective.contains(Permission::PriceChangesRequest));
    assert!(store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn revoking_role_derived_permission_is_immutable() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;

    let result = services
        .permissions
        .revoke(
            &store.actor(owner).await,
            staff,
            "products.view",
            AuditMetadata::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::PermissionImmutable(_))));
    assert!(store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn grant_then_revoke_round_trips_direct_overlay() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;
    let actor = store.actor(owner).await;

    let granted = services
        .permissions
        .grant(&actor, staff, "audit_log.view", AuditMetadata::default())
        .await;
    assert!(
        granted
            .map(|effective| effective.direct().contains(&Permission::AuditLogView))
            .unwrap_or(false)
    );

    let revoked = services
        .permissions
        .revoke(&actor, staff, "audit_log.view", AuditMetadata::default())
        .await;
    assert!(
        revoked
            .map(|effective| effective.direct().is_empty())
            .unwrap_or(false)
    );
    assert_eq!(store.audit_entries().await.len(), 2);
}

#[tokio::test]
async fn granting_role_derived_permission_writes_nothing() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;

    let result = services
        .permissions
        .grant(
            &store.actor(owner).await,
            staff,
            "products.view",
            AuditMetadata::default(),
        )
        .await;

    assert!(result.is_ok());
    assert!(store.audit_entries().await.is_empty());
    assert_eq!(
        store
            .principal(staff)
            .await
            .map(|principal| principal.direct_permissions().len()),
        Some(0)
    );
}

#[tokio::test]
async fn unknown_permission_name_is_validation_error() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;

    let result = services
        .permissions
        .sync_direct_permissions(
            &store.actor(owner).await,
            staff,
            &["products.fly"],
            AuditMetadata::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn editing_requires_permissions_manage() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let manager = store.seed_employee(1, DefaultRole::Manager, &[], &[]).await;
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;

    let result = services
        .permissions
        .grant(
            &store.actor(manager).await,
            staff,
            "audit_log.view",
            AuditMetadata::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn employees_can_inspect_their_own_permissions() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let staff = store.seed_employee(2, DefaultRole::Staff, &[], &[]).await;
    let other = store.seed_employee(3, DefaultRole::Finance, &[], &[]).await;
    let actor = store.actor(staff).await;

    let own = services
        .permissions
        .effective_permissions(&actor, staff)
        .await;
    assert!(own.is_ok());

    let foreign = services
        .permissions
        .effective_permissions(&actor, other)
        .await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn missing_principal_is_not_found() {
    let store = FakeStore::with_default_roles().await;
    let services = store.services();
    let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;

    let result = services
        .permissions
        .grant(
            &store.actor(owner).await,
            kasira_core::EmployeeId::new(404),
            "audit_log.view",
            AuditMetadata::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

fn permission_subset() -> impl Strategy<Value = Vec<Permission>> {
    prop::sample::subsequence(Permission::all().to_vec(), 0..=Permission::all().len())
}

proptest! {
    #[test]
    fn sync_leaves_exactly_desired_minus_role_derived(
        initial in permission_subset(),
        desired in permission_subset(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build();
        prop_assert!(runtime.is_ok());
        let Ok(runtime) = runtime else {
            return Ok(());
        };

        let (direct, role_derived) = runtime.block_on(async {
            let store = FakeStore::with_default_roles().await;
            let services = store.services();
            let owner = store.seed_employee(1, DefaultRole::Owner, &[], &[]).await;
            let target = store
                .seed_employee(2, DefaultRole::Finance, &[DefaultRole::Staff], &initial)
                .await;
            let names: Vec<&str> = desired.iter().map(Permission::as_str).collect();

            let effective = services
                .permissions
                .sync_direct_permissions(
                    &store.actor(owner).await,
                    target,
                    &names,
                    AuditMetadata::default(),
                )
                .await
                .unwrap_or_default();
            (effective.direct().clone(), effective.role_derived().clone())
        });

        let desired: BTreeSet<Permission> = desired.into_iter().collect();
        let expected: BTreeSet<Permission> = desired.difference(&role_derived).copied().collect();
        prop_assert_eq!(direct, expected);
        for permission in [
            Permission::ProductsView,
            Permission::PriceChangesRequest,
            Permission::PriceChangesApproveFinance,
        ] {
            prop_assert!(role_derived.contains(&permission));
        }
    }
}
