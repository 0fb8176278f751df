//! Direct-grant management on top of role-derived permissions.
//!
//! Every edit funnels through one sync: the caller describes the desired
//! effective set, the service diffs it against fresh state under the
//! principal lock, and writes the overlay together with a single audit
//! entry. Role-derived permissions are never touched here.

use std::collections::BTreeSet;
use std::sync::Arc;

use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{
    AuditChanges, AuditEvent, AuditMetadata, AuditSubjectType, DirectPermissionDiff,
    EffectivePermissions, Permission, PermissionCatalog,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    Actor, AuditRecord, AuthorizationService, PrincipalLocks, PrincipalRepository,
    TransactionalStore,
};

/// Application service for permission inspection and direct grants.
#[derive(Clone)]
pub struct PermissionService {
    authorization_service: AuthorizationService,
    principal_repository: Arc<dyn PrincipalRepository>,
    store: Arc<dyn TransactionalStore>,
    catalog: PermissionCatalog,
    locks: PrincipalLocks,
}

impl PermissionService {
    /// Creates a new permission service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        principal_repository: Arc<dyn PrincipalRepository>,
        store: Arc<dyn TransactionalStore>,
    ) -> Self {
        Self {
            authorization_service,
            principal_repository,
            store,
            catalog: PermissionCatalog::standard(),
            locks: PrincipalLocks::default(),
        }
    }

    /// Returns the permission catalog.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Returns a principal's effective permissions split by source.
    ///
    /// Employees may always inspect their own permissions.
    pub async fn effective_permissions(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
    ) -> AppResult<EffectivePermissions> {
        if actor.employee_id() == employee_id {
            return Ok(actor.permissions().clone());
        }
        actor.require(Permission::PermissionsManage)?;

        let principal = self
            .principal_repository
            .find_principal(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("principal '{employee_id}' not found")))?;

        self.authorization_service
            .effective_permissions(&principal)
            .await
    }

    /// Makes the direct overlay match `desired` minus role-derived permissions.
    pub async fn sync_direct_permissions<S: AsRef<str>>(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        desired: &[S],
        metadata: AuditMetadata,
    ) -> AppResult<EffectivePermissions> {
        let desired = self.catalog.parse_names(desired)?;
        self.apply_change(actor, employee_id, metadata, |_| Ok(desired))
            .await
    }

    /// Adds one direct grant. Granting a role-derived permission changes nothing.
    pub async fn grant(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        permission: &str,
        metadata: AuditMetadata,
    ) -> AppResult<EffectivePermissions> {
        let permission = Permission::from_transport(permission)?;
        self.apply_change(actor, employee_id, metadata, |effective| {
            let mut desired = effective.all();
            desired.insert(permission);
            Ok(desired)
        })
        .await
    }

    /// Removes one direct grant.
    ///
    /// Fails with `PermissionImmutable` when the permission comes from a role.
    pub async fn revoke(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        permission: &str,
        metadata: AuditMetadata,
    ) -> AppResult<EffectivePermissions> {
        let permission = Permission::from_transport(permission)?;
        self.apply_change(actor, employee_id, metadata, |effective| {
            if effective.role_derived().contains(&permission) {
                return Err(AppError::PermissionImmutable(format!(
                    "permission '{}' is granted by a role of principal '{employee_id}'",
                    permission.as_str()
                )));
            }

            let mut desired = effective.all();
            desired.remove(&permission);
            Ok(desired)
        })
        .await
    }

    async fn apply_change<F>(
        &self,
        actor: &Actor,
        employee_id: EmployeeId,
        metadata: AuditMetadata,
        desired_from: F,
    ) -> AppResult<EffectivePermissions>
    where
        F: FnOnce(&EffectivePermissions) -> AppResult<BTreeSet<Permission>> + Send,
    {
        actor.require(Permission::PermissionsManage)?;

        let roles = self.principal_repository.list_roles().await?;
        let _guard = self.locks.acquire(employee_id).await;
        let mut transaction = self.store.begin().await?;

        let principal = transaction
            .find_principal_for_update(employee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("principal '{employee_id}' not found")))?;
        let effective = EffectivePermissions::resolve(&principal, &roles);

        let desired = desired_from(&effective)?;
        let diff = DirectPermissionDiff::compute(&effective, &desired);
        if diff.is_empty() {
            debug!(employee_id = %employee_id, "direct permission sync changed nothing");
            return Ok(effective);
        }

        let stored = diff.apply_to(principal.direct_permissions());
        transaction
            .replace_direct_permissions(employee_id, &stored)
            .await?;

        let updated_effective =
            EffectivePermissions::resolve(&principal.with_direct_permissions(stored), &roles);

        AuditRecord {
            event: AuditEvent::Updated,
            subject_type: AuditSubjectType::Principal,
            subject_id: employee_id.to_string(),
            causer_id: Some(actor.employee_id()),
            changes: AuditChanges::single(
                "direct_permissions",
                permission_list(effective.direct()),
                permission_list(updated_effective.direct()),
            ),
            metadata,
        }
        .write(transaction.as_mut())
        .await?;

        transaction.commit().await?;

        info!(
            employee_id = %employee_id,
            causer_id = %actor.employee_id(),
            added = diff.additions.len(),
            removed = diff.removals.len(),
            "direct permissions synced"
        );

        Ok(updated_effective)
    }
}

fn permission_list(permissions: &BTreeSet<Permission>) -> Value {
    let mut names: Vec<&str> = permissions.iter().map(Permission::as_str).collect();
    names.sort_unstable();
    Value::from(names)
}

#[cfg(test)]
mod tests;
