use std::sync::Arc;

use kasira_core::{AppError, AppResult, EmployeeId};
use kasira_domain::{DefaultRole, EffectivePermissions, Permission, Principal, Role};

use crate::{EmployeeRepository, PrincipalRepository};

/// Authenticated principal resolved for one request.
///
/// Permissions are read from storage when the actor is resolved; nothing is
/// cached in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    principal: Principal,
    permissions: EffectivePermissions,
}

impl Actor {
    /// Creates an actor from a principal and its resolved permissions.
    #[must_use]
    pub fn new(principal: Principal, permissions: EffectivePermissions) -> Self {
        Self {
            principal,
            permissions,
        }
    }

    /// Returns the acting employee.
    #[must_use]
    pub fn employee_id(&self) -> EmployeeId {
        self.principal.id()
    }

    /// Returns the primary role, recorded on stage decisions.
    #[must_use]
    pub fn role_at_time(&self) -> &str {
        self.principal.primary_role()
    }

    /// Returns the authorization projection.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns effective permissions split by source.
    #[must_use]
    pub fn permissions(&self) -> &EffectivePermissions {
        &self.permissions
    }

    /// Returns whether the actor holds a permission from any source.
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Fails with `Forbidden` unless the actor holds the permission.
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has(permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "employee '{}' is missing permission '{}'",
            self.principal.id(),
            permission.as_str()
        )))
    }
}

/// Application service resolving principals into actors.
#[derive(Clone)]
pub struct AuthorizationService {
    principal_repository: Arc<dyn PrincipalRepository>,
    employee_repository: Arc<dyn EmployeeRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        principal_repository: Arc<dyn PrincipalRepository>,
        employee_repository: Arc<dyn EmployeeRepository>,
    ) -> Self {
        Self {
            principal_repository,
            employee_repository,
        }
    }

    /// Resolves the signed-in employee into an actor.
    ///
    /// Suspended and unknown accounts are treated as unauthenticated.
    pub async fn resolve_actor(&self, employee_id: EmployeeId) -> AppResult<Actor> {
        let employee = self
            .employee_repository
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!("employee '{employee_id}' no longer exists"))
            })?;
        if !employee.is_active() {
            return Err(AppError::Unauthorized(format!(
                "employee '{employee_id}' is suspended"
            )));
        }

        let principal = self
            .principal_repository
            .find_principal(employee_id)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(format!("employee '{employee_id}' has no role assignment"))
            })?;
        let permissions = self.effective_permissions(&principal).await?;

        Ok(Actor::new(principal, permissions))
    }

    /// Resolves effective permissions for an arbitrary principal.
    pub async fn effective_permissions(
        &self,
        principal: &Principal,
    ) -> AppResult<EffectivePermissions> {
        let roles = self.principal_repository.list_roles().await?;
        Ok(EffectivePermissions::resolve(principal, &roles))
    }

    /// Lists configured roles.
    pub async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.principal_repository.list_roles().await
    }

    /// Inserts the default role set where it is missing.
    pub async fn ensure_default_roles(&self) -> AppResult<()> {
        let roles = DefaultRole::all()
            .iter()
            .map(DefaultRole::definition)
            .collect::<AppResult<Vec<_>>>()?;
        self.principal_repository.ensure_roles(&roles).await
    }
}
